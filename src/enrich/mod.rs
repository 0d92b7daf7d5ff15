// src/enrich/mod.rs

pub mod panel;

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::config::page_url;
use crate::error::FetchError;
use crate::fetch::{fetch_document, PageFetcher};
use panel::{PanelRow, PANEL_TABLE};

/// Raw area and nominal GDP strings from a country's info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryDetails {
    pub area: String,
    pub gdp: String,
}

/// Fetch `<base>/<country_id>` and pull area + GDP out of its info panel.
///
/// Any failure degrades to `None`; the caller drops the row.
pub async fn enrich<F: PageFetcher>(
    fetcher: &F,
    base: &Url,
    country_id: &str,
) -> Option<CountryDetails> {
    let doc = match fetch_country_page(fetcher, base, country_id).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(country = country_id, error = %e, "country page unavailable");
            return None;
        }
    };

    let details = details_from_page(&doc);
    if details.is_none() {
        debug!(country = country_id, "no usable info panel");
    }
    details
}

async fn fetch_country_page<F: PageFetcher>(
    fetcher: &F,
    base: &Url,
    country_id: &str,
) -> Result<Html, FetchError> {
    let url = page_url(base, country_id).map_err(|source| FetchError::InvalidUrl {
        url: format!("{base}{country_id}"),
        source,
    })?;
    fetch_document(fetcher, &url).await
}

/// Scan the panel; exactly two captured values make a result.
pub fn details_from_page(doc: &Html) -> Option<CountryDetails> {
    let table_sel = Selector::parse(PANEL_TABLE).expect("panel selector should parse");
    let tr = Selector::parse("tr").expect("tr selector should parse");

    let table = doc.select(&table_sel).next()?;
    let rows: Vec<PanelRow> = table.select(&tr).map(PanelRow::classify).collect();

    let mut values = panel::scan(&rows).into_iter();
    match (values.next(), values.next(), values.next()) {
        (Some(area), Some(gdp), None) => Some(CountryDetails { area, gdp }),
        _ => None,
    }
}
