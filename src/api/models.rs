use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::data_models::PropertyType;

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "Type")]
    pub property_type: String,
    pub n_bedrooms: i64,
    pub n_bathrooms: i64,
    /// Kept as received so the response echoes it unchanged.
    pub area: Number,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub id: u32,
    pub n_bedrooms: i64,
    pub n_bathrooms: i64,
    pub area: Number,
    pub city: String,
    pub state: String,
    #[serde(rename = "Type")]
    pub property_type: PropertyType,
    pub price: i64,
}

/// Fields posted by the HTML form.
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub area: f64,
    pub n_bedrooms: i64,
    pub n_bathrooms: i64,
    pub property_type: String,
    pub state: String,
    pub city: String,
}
