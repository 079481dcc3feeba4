use std::path::PathBuf;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::predictor::PricePredictor;

pub mod handlers;
pub mod models;
pub mod templates;

#[derive(Clone)]
pub struct AppState {
    pub predictor: PricePredictor,
    /// Re-read on every request so the file can be edited while serving.
    pub state_cities_path: PathBuf,
}

pub fn create_router(state: AppState, allowed_origin: HeaderValue) -> Router {
    // CORS only applies to the JSON API
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([allowed_origin]))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/predict", post(handlers::predict_handler))
        .route("/locations", get(handlers::locations_handler))
        .layer(cors);

    Router::new()
        .route("/", get(handlers::form_page).post(handlers::form_submit))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
