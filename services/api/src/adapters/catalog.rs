//! services/api/src/adapters/catalog.rs
//!
//! Reads the estimator's parts list from a JSON file on disk. This is the concrete
//! implementation of the `CatalogSource` port.

use async_trait::async_trait;
use protolab_core::domain::{Catalog, CatalogItem, ItemClass};
use protolab_core::ports::{CatalogSource, PortError, PortResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

//=========================================================================================
// File Format
//=========================================================================================

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    microcontrollers: Vec<CatalogRecord>,
    #[serde(default)]
    sensors: Vec<CatalogRecord>,
    #[serde(default)]
    components: Vec<CatalogRecord>,
    #[serde(default)]
    actuators: Vec<CatalogRecord>,
    #[serde(default)]
    displays: Vec<CatalogRecord>,
}

#[derive(Deserialize)]
struct CatalogRecord {
    id: String,
    name: String,
    category: String,
    price: u64,
}
impl CatalogRecord {
    fn to_domain(self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            name: self.name,
            price: self.price,
            category: self.category,
        }
    }
}

impl CatalogFile {
    fn to_domain(self) -> PortResult<Catalog> {
        let classes = [
            (ItemClass::Microcontroller, self.microcontrollers),
            (ItemClass::Sensor, self.sensors),
            (ItemClass::Component, self.components),
            (ItemClass::Actuator, self.actuators),
            (ItemClass::Display, self.displays),
        ];

        let mut out = Vec::with_capacity(classes.len());
        for (class, records) in classes {
            let mut seen = HashSet::new();
            for record in &records {
                if !seen.insert(record.id.as_str()) {
                    return Err(PortError::Unexpected(format!(
                        "duplicate id '{}' in {}",
                        record.id, class
                    )));
                }
            }
            out.push((class, records.into_iter().map(|r| r.to_domain()).collect()));
        }
        Ok(Catalog::new(out))
    }
}

/// Parses catalog JSON text.
pub fn parse_catalog(json: &str) -> PortResult<Catalog> {
    let file: CatalogFile = serde_json::from_str(json)
        .map_err(|e| PortError::Unexpected(format!("invalid catalog JSON: {}", e)))?;
    file.to_domain()
}

//=========================================================================================
// The Adapter Struct
//=========================================================================================

#[derive(Clone, Debug)]
pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn load_catalog(&self) -> PortResult<Catalog> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PortError::NotFound(format!("catalog file {}", self.path.display()))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        parse_catalog(&text)
    }
}
