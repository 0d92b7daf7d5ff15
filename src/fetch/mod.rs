// src/fetch/mod.rs

use reqwest::Client;
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Something that can return the body of a page.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;
}

/// Plain HTTP fetcher. No retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        debug!("Fetching text from {}", url);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}

/// Fetch `url` and parse it into a document tree.
pub async fn fetch_document<F: PageFetcher>(fetcher: &F, url: &Url) -> Result<Html, FetchError> {
    let body = fetcher.fetch_text(url).await?;
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody {
            url: url.to_string(),
        });
    }
    Ok(Html::parse_document(&body))
}
