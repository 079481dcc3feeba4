use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        seed_url: get_env_or_default(
            "SEED_URL",
            "https://www.affare.tn/petites-annonces/tunisie/immobilier",
        ),
        site_base_url: get_env_or_default("SITE_BASE_URL", "https://www.affare.tn"),
        crawl_concurrency: get_env_parsed_or("CRAWL_CONCURRENCY", 16),
        max_listing_failures: get_env_parsed_or("MAX_LISTING_FAILURES", 3),
        listings_output: get_env_or_default("LISTINGS_OUTPUT", "listings.jsonl"),
        listen_addr: get_env_or_default("LISTEN_ADDR", "127.0.0.1:5000"),
        model_path: get_env_or_default("MODEL_PATH", "data/final_model.json"),
        state_cities_path: get_env_or_default("STATE_CITIES_PATH", "data/state_cities.json"),
        cors_origin: get_env_or_default("CORS_ORIGIN", "https://dariprice.onrender.com"),
        user_agent: get_env_or_default(
            "USER_AGENT",
            concat!("dariprice/", env!("CARGO_PKG_VERSION")),
        ),
    }
});

#[derive(Debug, Clone)]
pub struct Config {
    pub seed_url: String,
    pub site_base_url: String,
    pub crawl_concurrency: usize,
    /// Listing pages allowed to fail in a row before the crawl gives up.
    pub max_listing_failures: usize,
    pub listings_output: String,
    pub listen_addr: String,
    pub model_path: String,
    pub state_cities_path: String,
    pub cors_origin: String,
    pub user_agent: String,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparsable value for {key}: {raw:?}");
            default
        }),
        Err(_) => default,
    }
}
