use std::sync::Arc;

use crate::data_models::PropertyType;
use crate::error::{Error, Result};
use crate::model::{PriceModel, PropertyFeatures};

/// Raw property description as submitted by a client, type label unnormalized.
#[derive(Debug, Clone, Copy)]
pub struct PropertyQuery<'a> {
    pub type_label: &'a str,
    pub n_bedrooms: i64,
    pub n_bathrooms: i64,
    pub area: f64,
    pub city: &'a str,
    pub state: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub features: PropertyFeatures,
    pub price: i64,
}

/// Shared by the JSON API and the HTML form; both go through `estimate`.
#[derive(Clone)]
pub struct PricePredictor {
    model: Arc<dyn PriceModel>,
}

impl PricePredictor {
    pub fn new(model: Arc<dyn PriceModel>) -> PricePredictor {
        PricePredictor { model }
    }

    pub fn estimate(&self, query: &PropertyQuery) -> Result<Estimate> {
        let features = PropertyFeatures {
            area: query.area,
            n_bedrooms: query.n_bedrooms,
            n_bathrooms: query.n_bathrooms,
            property_type: PropertyType::from_label(query.type_label),
            city: query.city.to_string(),
            state: query.state.to_string(),
        };

        let raw = self.model.predict(&features)?;
        let price = truncate_price(raw)?;
        log::info!(
            "estimated {} {}m² in {}/{}: {price}",
            features.property_type,
            features.area,
            features.state,
            features.city
        );
        Ok(Estimate { features, price })
    }
}

/// Drops the fractional part, rounding toward zero.
fn truncate_price(raw: f64) -> Result<i64> {
    if !raw.is_finite() || raw.abs() >= i64::MAX as f64 {
        return Err(Error::NonFinite(raw));
    }
    Ok(raw.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_price() {
        assert_eq!(truncate_price(245_999.99).unwrap(), 245_999);
        assert_eq!(truncate_price(-3.7).unwrap(), -3);
        assert!(matches!(truncate_price(f64::NAN), Err(Error::NonFinite(_))));
        assert!(matches!(truncate_price(f64::INFINITY), Err(Error::NonFinite(_))));
    }
}
