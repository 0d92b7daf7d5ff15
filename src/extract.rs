// src/extract.rs

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use url::Url;

use crate::error::{Result, ScrapeError};

/// Listing rows are kept only when their link contains this.
pub const LINK_FILTER: &str = "Demographics_of";
pub const DEMOGRAPHICS_PATH_PREFIX: &str = "/wiki/Demographics_of_";
const LISTING_TABLE: &str = "table.wikitable.sortable";

/// One accepted row of the listing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Page title of the country, e.g. `India`.
    pub country_id: String,
    pub link: String,
    pub cells: Vec<String>,
}

/// Why listing rows were dropped before enrichment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub rows_seen: usize,
    pub no_link: usize,
    pub filtered_out: usize,
    pub malformed_link: usize,
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub stats: ExtractStats,
}

/// Walk the listing table and return its header cells plus every row that
/// links to a demographics page.
pub fn extract_rows(doc: &Html, base: &Url) -> Result<Listing> {
    let table_sel = Selector::parse(LISTING_TABLE).expect("listing table selector should parse");
    let tr = Selector::parse("tr").expect("tr selector should parse");
    let th = Selector::parse("th").expect("th selector should parse");
    let td = Selector::parse("td").expect("td selector should parse");
    let a = Selector::parse("a").expect("a selector should parse");

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or(ScrapeError::TableNotFound {
            selector: LISTING_TABLE,
        })?;

    let mut trs = table.select(&tr);
    let headers: Vec<String> = trs
        .next()
        .map(|row| {
            row.select(&th)
                .map(|h| h.text().collect::<String>().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut rows = Vec::new();
    let mut stats = ExtractStats::default();

    for row in trs {
        let cells: Vec<ElementRef> = row.select(&td).collect();
        if cells.is_empty() {
            continue;
        }
        stats.rows_seen += 1;

        let Some(link) = cells[0]
            .select(&a)
            .next()
            .and_then(|el| el.value().attr("href"))
        else {
            stats.no_link += 1;
            continue;
        };

        if !link.contains(LINK_FILTER) {
            debug!(link, "skipping row without demographics link");
            stats.filtered_out += 1;
            continue;
        }

        let country_id = match country_id_from_link(base, link) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "skipping row");
                stats.malformed_link += 1;
                continue;
            }
        };

        rows.push(RawRow {
            country_id,
            link: link.to_string(),
            cells: cells.into_iter().map(cell_text).collect(),
        });
    }

    debug!(
        accepted = rows.len(),
        seen = stats.rows_seen,
        "extracted listing rows"
    );
    Ok(Listing {
        headers,
        rows,
        stats,
    })
}

/// `/wiki/Demographics_of_India` → `India`. Relative and absolute hrefs are
/// both accepted; anything else on the path is rejected.
pub fn country_id_from_link(base: &Url, link: &str) -> Result<String> {
    let unexpected = || ScrapeError::UnexpectedLink {
        link: link.to_string(),
        prefix: "Demographics_of_",
    };

    let url = base.join(link).map_err(|_| unexpected())?;
    let id = url
        .path()
        .strip_prefix(DEMOGRAPHICS_PATH_PREFIX)
        .filter(|id| !id.is_empty() && !id.contains('/'))
        .ok_or_else(unexpected)?;

    Ok(id.to_string())
}

/// Cell text, compatibility-decomposed and trimmed.
pub fn cell_text(cell: ElementRef) -> String {
    let raw: String = cell.text().collect();
    raw.nfkd().collect::<String>().trim().to_string()
}
