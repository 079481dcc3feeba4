use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;

/// Labels discovered on a detail page, label -> value. Any label is accepted.
pub type Attributes = BTreeMap<String, String>;

/// One scraped classified ad. Only `url` is guaranteed, every other field is
/// whatever the page's markup yielded.
///
/// Serialized as one flat JSON object. An attribute whose label collides with
/// a field name (`Type`, `title`, ...) is left out so every key is unique.
#[derive(Deserialize, Debug, Clone)]
pub struct Listing {
    pub url: String,
    #[serde(rename = "Type")]
    pub property_type: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    pub posting_date: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
    pub scraped_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(url: String) -> Listing {
        Listing {
            url,
            property_type: None,
            title: None,
            price: None,
            location: None,
            posting_date: None,
            description: None,
            attributes: Attributes::new(),
            scraped_at: Utc::now(),
        }
    }
}

const FIELD_KEYS: [&str; 8] = [
    "url",
    "Type",
    "title",
    "price",
    "location",
    "posting_date",
    "description",
    "scraped_at",
];

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("url", &self.url)?;
        map.serialize_entry("Type", &self.property_type)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("price", &self.price)?;
        map.serialize_entry("location", &self.location)?;
        map.serialize_entry("posting_date", &self.posting_date)?;
        map.serialize_entry("description", &self.description)?;
        for (label, value) in &self.attributes {
            if !FIELD_KEYS.contains(&label.as_str()) {
                map.serialize_entry(label, value)?;
            }
        }
        map.serialize_entry("scraped_at", &self.scraped_at)?;
        map.end()
    }
}

/// The two property kinds the price model was trained on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Villa,
    Appartement,
}

impl PropertyType {
    /// Only the exact label `House` is a villa; anything else, empty string
    /// included, is an apartment.
    pub fn from_label(label: &str) -> PropertyType {
        if label == "House" {
            PropertyType::Villa
        } else {
            PropertyType::Appartement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Villa => "villa",
            PropertyType::Appartement => "appartement",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State (gouvernorat) -> cities, as persisted next to the model.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct StateCities(BTreeMap<String, Vec<String>>);

impl StateCities {
    pub async fn load(path: impl AsRef<Path>) -> Result<StateCities> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// States in alphabetical order, each with its cities sorted.
    pub fn sorted(&self) -> Vec<(&str, Vec<&str>)> {
        self.0
            .iter()
            .map(|(state, cities)| {
                let mut cities: Vec<&str> = cities.iter().map(String::as_str).collect();
                cities.sort_unstable();
                (state.as_str(), cities)
            })
            .collect()
    }
}
