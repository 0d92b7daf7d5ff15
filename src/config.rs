// src/config.rs

use std::{env, path::PathBuf};
use url::Url;

use crate::error::{Result, ScrapeError};

pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/wiki/";
pub const DEFAULT_LISTING_PAGE: &str = "List_of_countries_and_dependencies_by_population";
pub const DEFAULT_OUTPUT: &str = "Dataset.csv";
pub const USER_AGENT: &str = concat!("popscraper/", env!("CARGO_PKG_VERSION"));

/// Settings for one scrape run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Wiki root; page titles are joined onto it.
    pub base_url: Url,
    pub listing_page: String,
    pub output_path: PathBuf,
    /// Optional Parquet copy of the dataset.
    pub parquet_path: Option<PathBuf>,
    pub user_agent: String,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url should parse"),
            listing_page: DEFAULT_LISTING_PAGE.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            parquet_path: None,
            user_agent: USER_AGENT.to_string(),
            show_progress: true,
        }
    }
}

impl Config {
    /// Defaults, overridden by any `POPSCRAPER_*` variables present.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(base) = lookup("POPSCRAPER_BASE_URL") {
            cfg.base_url = parse_base_url(&base)?;
        }
        if let Some(page) = lookup("POPSCRAPER_LISTING_PAGE") {
            if page.trim().is_empty() {
                return Err(ScrapeError::Config(
                    "POPSCRAPER_LISTING_PAGE is empty".to_string(),
                ));
            }
            cfg.listing_page = page.trim().to_string();
        }
        if let Some(out) = lookup("POPSCRAPER_OUTPUT") {
            cfg.output_path = PathBuf::from(out);
        }
        cfg.parquet_path = lookup("POPSCRAPER_PARQUET")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        if let Some(flag) = lookup("POPSCRAPER_PROGRESS") {
            cfg.show_progress = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        Ok(cfg)
    }

    /// Full URL of a page title under the wiki root.
    pub fn page_url(&self, title: &str) -> std::result::Result<Url, url::ParseError> {
        page_url(&self.base_url, title)
    }

    pub fn listing_url(&self) -> std::result::Result<Url, url::ParseError> {
        self.page_url(&self.listing_page)
    }
}

/// Titles like `Talk:X` would otherwise parse as a URL scheme.
pub fn page_url(base: &Url, title: &str) -> std::result::Result<Url, url::ParseError> {
    base.join(&format!("./{title}"))
}

/// `Url::join` drops the last segment unless the base ends in `/`.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw)
        .map_err(|e| ScrapeError::Config(format!("POPSCRAPER_BASE_URL {raw:?}: {e}")))
}
