// src/error.rs

use thiserror::Error;

/// Failure to retrieve a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid page url {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("GET {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("GET {url} returned an empty body")]
    EmptyBody { url: String },
}

/// A scraped string that cannot be turned into the value its column expects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no digits left in {raw:?}")]
    Empty { raw: String },

    #[error("malformed number {digits:?} (from {raw:?})")]
    Malformed { raw: String, digits: String },

    #[error("value {raw:?} does not fit in 64 bits")]
    Overflow { raw: String },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no table matching `{selector}` on the listing page")]
    TableNotFound { selector: &'static str },

    #[error("link {link:?} is not of the form /wiki/{prefix}<Country>")]
    UnexpectedLink { link: String, prefix: &'static str },

    #[error("column {column:?}: {source}")]
    Normalize {
        column: String,
        #[source]
        source: NormalizeError,
    },

    #[error("column mismatch: {0}")]
    ColumnMismatch(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
