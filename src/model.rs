use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data_models::PropertyType;
use crate::error::{Error, Result};

/// One row of model input.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFeatures {
    pub area: f64,
    pub n_bedrooms: i64,
    pub n_bathrooms: i64,
    pub property_type: PropertyType,
    pub city: String,
    pub state: String,
}

/// A trained price regressor. Implementations are shared between request
/// handlers, so `predict` must be safe to call concurrently.
pub trait PriceModel: Send + Sync {
    fn predict(&self, features: &PropertyFeatures) -> Result<f64>;

    fn name(&self) -> &str;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NumericWeights {
    pub area: f64,
    pub n_bedrooms: f64,
    pub n_bathrooms: f64,
}

/// One-hot weights per categorical column. A category missing from the map
/// contributes nothing, the same as an unseen level at training time.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CategoricalWeights {
    #[serde(rename = "Type", default)]
    pub property_type: HashMap<String, f64>,
    #[serde(default)]
    pub city: HashMap<String, f64>,
    #[serde(default)]
    pub state: HashMap<String, f64>,
}

/// Linear regression exported as JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinearPriceModel {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub intercept: f64,
    pub coefficients: NumericWeights,
    #[serde(default)]
    pub categories: CategoricalWeights,
    /// The target was trained as `ln(price)`.
    #[serde(default)]
    pub log_target: bool,
}

fn default_model_name() -> String {
    "linear".to_string()
}

impl LinearPriceModel {
    pub async fn load(path: impl AsRef<Path>) -> Result<LinearPriceModel> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| model_load_error(path, e))?;
        Self::from_json(&raw).map_err(|e| model_load_error(path, e))
    }

    pub fn from_json(raw: &str) -> Result<LinearPriceModel> {
        let model: LinearPriceModel = serde_json::from_str(raw)?;
        Ok(model)
    }

    fn score(&self, features: &PropertyFeatures) -> f64 {
        let weights = &self.coefficients;
        let categories = &self.categories;
        let category = |table: &HashMap<String, f64>, key: &str| -> f64 {
            table.get(key).copied().unwrap_or(0.0)
        };

        self.intercept
            + weights.area * features.area
            + weights.n_bedrooms * features.n_bedrooms as f64
            + weights.n_bathrooms * features.n_bathrooms as f64
            + category(&categories.property_type, features.property_type.as_str())
            + category(&categories.city, &features.city)
            + category(&categories.state, &features.state)
    }
}

impl PriceModel for LinearPriceModel {
    fn predict(&self, features: &PropertyFeatures) -> Result<f64> {
        let score = self.score(features);
        let price = if self.log_target { score.exp() } else { score };
        Ok(price)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn model_load_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::ModelLoad {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> PropertyFeatures {
        PropertyFeatures {
            area: 150.0,
            n_bedrooms: 3,
            n_bathrooms: 2,
            property_type: PropertyType::Villa,
            city: "Tunis".into(),
            state: "Tunis".into(),
        }
    }

    #[test]
    fn test_linear_score() {
        let model = LinearPriceModel::from_json(
            r#"{
                "intercept": 1000.0,
                "coefficients": {"area": 10.0, "n_bedrooms": 100.0, "n_bathrooms": 50.0},
                "categories": {"Type": {"villa": 500.0}, "state": {"Tunis": 7.5}}
            }"#,
        )
        .unwrap();
        // 1000 + 1500 + 300 + 100 + 500 + 0 (city unseen) + 7.5
        assert_eq!(model.predict(&features()).unwrap(), 3407.5);
        assert_eq!(model.name(), "linear");
    }

    #[test]
    fn test_log_target_is_exponentiated() {
        let model = LinearPriceModel::from_json(
            r#"{
                "intercept": 0.0,
                "coefficients": {"area": 0.0, "n_bedrooms": 0.0, "n_bathrooms": 0.0},
                "log_target": true
            }"#,
        )
        .unwrap();
        assert_eq!(model.predict(&features()).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_coefficients_is_an_error() {
        assert!(LinearPriceModel::from_json(r#"{"intercept": 1.0}"#).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_model_load_error() {
        let err = LinearPriceModel::load("does/not/exist.json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModelLoad { .. }));
    }
}
