//! Catalog layer overrides loaded from JSON.
//!
//! ```json
//! { "layers": { "fish": 2, "coin": 3, "alien": 4 } }
//! ```
//!
//! Only layers are configurable. Removal rules and extra-argument providers
//! are code and stay in the catalog built by the game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::{Catalog, CategoryDescriptor};

/// Errors from catalog configuration I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Draw-layer overrides keyed by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub layers: BTreeMap<String, i32>,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current layers of a catalog.
    pub fn capture(catalog: &Catalog) -> Self {
        Self {
            layers: catalog
                .iter()
                .map(|(name, d)| (name.to_string(), d.layer))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Save to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Apply the overrides. Categories the catalog lacks are added with only a
    /// layer (no removal rule, no extra arguments). Returns how many
    /// categories were touched.
    pub fn apply(&self, catalog: &mut Catalog) -> usize {
        for (name, &layer) in &self.layers {
            if !catalog.set_layer(name, layer) {
                tracing::debug!(category = %name, layer, "config adds layer-only category");
                catalog.insert(name.clone(), CategoryDescriptor::new(layer));
            }
        }
        self.layers.len()
    }
}
