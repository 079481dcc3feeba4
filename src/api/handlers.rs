use axum::{
    Form, Json,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
};
use maud::Markup;

use crate::data_models::StateCities;
use crate::predictor::PropertyQuery;

use super::AppState;
use super::models::{PredictForm, PredictionRequest, PredictionResponse};
use super::templates;

/// Placeholder id returned with every prediction.
const PREDICTION_ID: u32 = 1;

pub async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|e| (e.status(), e.body_text()))?;
    log::info!("received prediction request: {:?}", request);

    let area = request.area.as_f64().ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            "area must be a number".to_string(),
        )
    })?;

    let query = PropertyQuery {
        type_label: &request.property_type,
        n_bedrooms: request.n_bedrooms,
        n_bathrooms: request.n_bathrooms,
        area,
        city: &request.city,
        state: &request.state,
    };
    let estimate = state.predictor.estimate(&query).map_err(|e| {
        log::error!("prediction failed, error: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Prediction error: {}", e),
        )
    })?;

    Ok(Json(PredictionResponse {
        id: PREDICTION_ID,
        n_bedrooms: request.n_bedrooms,
        n_bathrooms: request.n_bathrooms,
        area: request.area,
        city: request.city,
        state: request.state,
        property_type: estimate.features.property_type,
        price: estimate.price,
    }))
}

pub async fn locations_handler(
    State(state): State<AppState>,
) -> Result<Json<StateCities>, (StatusCode, String)> {
    let locations = StateCities::load(&state.state_cities_path)
        .await
        .map_err(|e| {
            log::error!("error loading {}, error: {:#}", state.state_cities_path.display(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Locations unavailable".to_string(),
            )
        })?;
    Ok(Json(locations))
}

pub async fn form_page(State(state): State<AppState>) -> Result<Markup, (StatusCode, Markup)> {
    let locations = StateCities::load(&state.state_cities_path)
        .await
        .map_err(|e| {
            log::error!("error loading {}, error: {:#}", state.state_cities_path.display(), e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, templates::error_page(status, "Locations are unavailable right now."))
        })?;
    Ok(templates::index_page(&locations))
}

pub async fn form_submit(
    State(state): State<AppState>,
    form: Result<Form<PredictForm>, FormRejection>,
) -> Result<Markup, (StatusCode, Markup)> {
    let Form(form) = form.map_err(|e| {
        let status = e.status();
        (status, templates::error_page(status, &e.body_text()))
    })?;

    let query = PropertyQuery {
        type_label: &form.property_type,
        n_bedrooms: form.n_bedrooms,
        n_bathrooms: form.n_bathrooms,
        area: form.area,
        city: &form.city,
        state: &form.state,
    };
    let estimate = state.predictor.estimate(&query).map_err(|e| {
        log::error!("prediction failed, error: {:#}", e);
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (status, templates::error_page(status, "The price could not be estimated."))
    })?;

    Ok(templates::result_page(&estimate))
}
