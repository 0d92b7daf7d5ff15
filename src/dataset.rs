// src/dataset.rs

use crate::enrich::CountryDetails;
use crate::extract::{ExtractStats, RawRow};

/// A listing row with its two enrichment strings appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    pub country_id: String,
    pub cells: Vec<String>,
}

impl CountryRecord {
    pub fn new(row: RawRow, details: CountryDetails) -> Self {
        let mut cells = row.cells;
        cells.push(details.area);
        cells.push(details.gdp);
        Self {
            country_id: row.country_id,
            cells,
        }
    }
}

/// Everything one run scraped, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    /// Header cells exactly as they appear on the listing table.
    pub headers: Vec<String>,
    pub records: Vec<CountryRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub listing: ExtractStats,
    pub enrichment_failed: usize,
    pub retained: usize,
}

impl RunStats {
    /// Rows that reached the listing loop but not the dataset.
    pub fn dropped(&self) -> usize {
        self.listing.rows_seen.saturating_sub(self.retained)
    }
}
