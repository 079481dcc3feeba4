pub mod api;
pub mod config;
pub mod crawler;
pub mod data_models;
pub mod error;
pub mod extractor;
pub mod model;
pub mod pagination;
pub mod predictor;
pub mod sink;

pub use error::{Error, Result};
