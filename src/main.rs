use anyhow::{Context, Result};
use popscraper::{config::Config, fetch::HttpFetcher, pipeline, progress::ScrapeProgress};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let config = Config::from_env().context("reading configuration")?;
    let fetcher = HttpFetcher::new(&config.user_agent).context("building HTTP client")?;
    let progress = ScrapeProgress::new(config.show_progress);

    // ─── 3) scrape listing + enrich every row ────────────────────────
    let scrape = pipeline::run(&fetcher, &config, &progress)
        .await
        .with_context(|| format!("scraping {}", config.listing_page))?;

    if scrape.stats.dropped() > 0 {
        info!(
            dropped = scrape.stats.dropped(),
            "rows left out of the dataset"
        );
    }

    // ─── 4) normalize + write ────────────────────────────────────────
    pipeline::write_outputs(&scrape.dataset, &config)
        .with_context(|| format!("writing {}", config.output_path.display()))?;

    info!(
        rows = scrape.dataset.len(),
        path = %config.output_path.display(),
        "all done"
    );
    Ok(())
}
