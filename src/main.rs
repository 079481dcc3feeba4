use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use dariprice::api::{AppState, create_router};
use dariprice::config::CONFIG;
use dariprice::crawler::{Crawler, HttpFetcher};
use dariprice::extractor::{ListingExtractor, ListingSelectors};
use dariprice::model::LinearPriceModel;
use dariprice::pagination::{CrawlSession, ListingPageSelectors, Paginator};
use dariprice::predictor::PricePredictor;
use dariprice::sink::{JsonLinesSink, spawn_sink};

#[derive(Parser)]
#[command(version, about = "Tunisian real-estate scraper and price estimator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every listing reachable from the seed search page
    Crawl {
        #[arg(long, default_value_t = CONFIG.seed_url.clone())]
        seed: String,
        #[arg(long, default_value_t = CONFIG.site_base_url.clone())]
        base_url: String,
        #[arg(short, long, default_value_t = CONFIG.listings_output.clone())]
        output: String,
        #[arg(short, long, default_value_t = CONFIG.crawl_concurrency)]
        concurrency: usize,
        #[arg(long, default_value_t = CONFIG.max_listing_failures)]
        max_listing_failures: usize,
    },
    /// Serve the prediction API and form
    Serve {
        #[arg(long, default_value_t = CONFIG.listen_addr.clone())]
        addr: String,
        #[arg(long, default_value_t = CONFIG.model_path.clone())]
        model: String,
        #[arg(long, default_value_t = CONFIG.state_cities_path.clone())]
        state_cities: String,
        #[arg(long, default_value_t = CONFIG.cors_origin.clone())]
        cors_origin: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Also captures records from the `log` facade used by the library
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    match Cli::parse().command {
        Command::Crawl {
            seed,
            base_url,
            output,
            concurrency,
            max_listing_failures,
        } => crawl(&seed, &base_url, &output, concurrency, max_listing_failures).await,
        Command::Serve {
            addr,
            model,
            state_cities,
            cors_origin,
        } => serve(&addr, &model, state_cities.into(), &cors_origin).await,
    }
}

async fn crawl(
    seed: &str,
    base_url: &str,
    output: &str,
    concurrency: usize,
    max_listing_failures: usize,
) -> anyhow::Result<()> {
    let session = Arc::new(CrawlSession::new(seed, base_url).context("invalid crawl urls")?);
    let crawler = Crawler::new(
        HttpFetcher::new(&CONFIG.user_agent)?,
        ListingExtractor::new(ListingSelectors::default())?,
        Paginator::new(&ListingPageSelectors::default())?,
        concurrency,
    )
    .with_max_listing_failures(max_listing_failures);

    let sink = JsonLinesSink::open(output)
        .await
        .with_context(|| format!("cannot open {output}"))?;
    let (listings_tx, listings_rx) = mpsc::unbounded_channel();
    let sink_handle = spawn_sink(sink, listings_rx);

    let stats = crawler.run(session, listings_tx).await;
    let written = sink_handle.await??;
    println!(
        "{} listing pages, {} ads, {} written to {output}, {} failed pages",
        stats.listing_pages, stats.detail_pages, written, stats.failed_pages
    );
    Ok(())
}

async fn serve(
    addr: &str,
    model_path: &str,
    state_cities_path: PathBuf,
    cors_origin: &str,
) -> anyhow::Result<()> {
    let model = LinearPriceModel::load(model_path)
        .await
        .context("refusing to start without a model")?;
    log::info!("loaded model {} from {model_path}", model.name);

    let state = AppState {
        predictor: PricePredictor::new(Arc::new(model)),
        state_cities_path,
    };
    let origin = HeaderValue::from_str(cors_origin)
        .with_context(|| format!("invalid CORS origin {cors_origin:?}"))?;
    let app = create_router(state, origin);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    log::info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
