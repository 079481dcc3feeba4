use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("expected an element at index {index} for `{selector}`, page only has {found}")]
    MissingNode {
        selector: String,
        index: usize,
        found: usize,
    },

    #[error("attribute row without any label text")]
    MissingLabel,

    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("crawl scheduler shut down: {0}")]
    SchedulerClosed(#[from] tokio::sync::AcquireError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("model produced an unusable prediction ({0})")]
    NonFinite(f64),
}
