// src/pipeline.rs

use tracing::{info, instrument};

use crate::assemble;
use crate::config::Config;
use crate::dataset::{CountryRecord, Dataset, RunStats};
use crate::enrich::enrich;
use crate::error::{FetchError, Result};
use crate::extract::extract_rows;
use crate::fetch::{fetch_document, PageFetcher};
use crate::progress::ScrapeProgress;

/// Output of a completed run.
#[derive(Debug, Clone)]
pub struct Scrape {
    pub dataset: Dataset,
    pub stats: RunStats,
}

/// Fetch the listing, then enrich its rows one at a time.
///
/// Only the listing fetch and table lookup are fatal; a country page that
/// cannot be read or lacks either figure just drops its row.
#[instrument(level = "info", skip_all, fields(listing = %config.listing_page))]
pub async fn run<F: PageFetcher>(
    fetcher: &F,
    config: &Config,
    progress: &ScrapeProgress,
) -> Result<Scrape> {
    progress.waiting("fetching listing page");

    let listing_url = config
        .listing_url()
        .map_err(|source| FetchError::InvalidUrl {
            url: format!("{}{}", config.base_url, config.listing_page),
            source,
        })?;
    let listing = {
        let doc = fetch_document(fetcher, &listing_url).await?;
        extract_rows(&doc, &config.base_url)?
    };
    info!(rows = listing.rows.len(), "listing extracted");

    progress.begin(listing.rows.len());

    let mut records = Vec::with_capacity(listing.rows.len());
    let mut enrichment_failed = 0;

    for row in listing.rows {
        let country = row.country_id.clone();
        match enrich(fetcher, &config.base_url, &row.country_id).await {
            Some(details) => records.push(CountryRecord::new(row, details)),
            None => enrichment_failed += 1,
        }
        progress.row_done(&country);
    }
    progress.finish();

    let stats = RunStats {
        listing: listing.stats,
        enrichment_failed,
        retained: records.len(),
    };
    info!(
        seen = stats.listing.rows_seen,
        retained = stats.retained,
        no_link = stats.listing.no_link,
        filtered_out = stats.listing.filtered_out,
        malformed_link = stats.listing.malformed_link,
        enrichment_failed = stats.enrichment_failed,
        "scrape finished"
    );

    Ok(Scrape {
        dataset: Dataset {
            headers: listing.headers,
            records,
        },
        stats,
    })
}

/// Normalize, assemble and write the configured output files.
pub fn write_outputs(dataset: &Dataset, config: &Config) -> Result<()> {
    let batch = assemble::assemble(dataset)?;
    assemble::write_outputs(&batch, &config.output_path, config.parquet_path.as_deref())
}
