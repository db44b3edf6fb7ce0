//! LineCatalog - static bus line geometries
//!
//! Loaded once at startup from a GeoJSON FeatureCollection and never mutated.
//! Features are looked up by their integer `code` property.

use std::path::Path;

use geojson::{Feature, GeoJson};
use serde_json::Value;
use tracing::{info, instrument};

use contracts::ContractError;

/// Immutable set of line features
#[derive(Debug, Default)]
pub struct LineCatalog {
    features: Vec<Feature>,
}

impl LineCatalog {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parse a FeatureCollection.
    ///
    /// # Errors
    /// `ConfigParse` for invalid GeoJSON or a document that is not a
    /// FeatureCollection.
    pub fn from_geojson_str(text: &str) -> Result<Self, ContractError> {
        parse_features(text)
            .map(Self::new)
            .map_err(ContractError::config_parse)
    }

    /// Read and parse a FeatureCollection file
    #[instrument(name = "line_catalog_load", skip(path), fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let text = std::fs::read_to_string(path)?;
        let features = parse_features(&text)
            .map_err(|message| ContractError::config_parse(format!("{}: {message}", path.display())))?;

        info!(lines = features.len(), "Line catalog loaded");
        Ok(Self::new(features))
    }

    /// Feature whose `code` property equals `code`
    pub fn find(&self, code: i64) -> Option<&Feature> {
        self.features
            .iter()
            .find(|feature| feature.property("code").and_then(Value::as_i64) == Some(code))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn parse_features(text: &str) -> Result<Vec<Feature>, String> {
    match text.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => Ok(collection.features),
        Ok(_) => Err("expected a GeoJSON FeatureCollection".to_string()),
        Err(e) => Err(format!("invalid GeoJSON: {e}")),
    }
}
