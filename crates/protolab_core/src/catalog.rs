//! crates/protolab_core/src/catalog.rs
//!
//! One-shot catalog loading at startup.

use tracing::{info, warn};

use crate::domain::{Catalog, ItemClass};
use crate::ports::CatalogSource;

pub const CATALOG_UNAVAILABLE_BANNER: &str =
    "Component prices are temporarily unavailable. Estimates will show zero until the catalog is restored.";

/// The catalog the process runs with, plus a banner to show when loading failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub banner: Option<String>,
}

/// Loads the catalog once; on failure falls back to an empty catalog with a banner.
pub async fn load_catalog_or_empty(source: &dyn CatalogSource) -> LoadedCatalog {
    match source.load_catalog().await {
        Ok(catalog) => {
            let count: usize = ItemClass::ALL
                .into_iter()
                .map(|class| catalog.items(class).len())
                .sum();
            info!("Catalog loaded with {} items", count);
            LoadedCatalog {
                catalog,
                banner: None,
            }
        }
        Err(e) => {
            warn!("Failed to load catalog, continuing with an empty one: {}", e);
            LoadedCatalog {
                catalog: Catalog::default(),
                banner: Some(CATALOG_UNAVAILABLE_BANNER.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CatalogItem;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;

    struct Fixed(Option<Catalog>);

    #[async_trait]
    impl CatalogSource for Fixed {
        async fn load_catalog(&self) -> PortResult<Catalog> {
            self.0
                .clone()
                .ok_or_else(|| PortError::Unexpected("file missing".into()))
        }
    }

    #[tokio::test]
    async fn successful_load_has_no_banner() {
        let catalog = Catalog::new([(
            ItemClass::Microcontroller,
            vec![CatalogItem {
                id: "uno".into(),
                name: "Arduino Uno".into(),
                price: 450,
                category: "Arduino".into(),
            }],
        )]);
        let loaded = load_catalog_or_empty(&Fixed(Some(catalog.clone()))).await;
        assert_eq!(loaded.catalog, catalog);
        assert!(loaded.banner.is_none());
    }

    #[tokio::test]
    async fn failed_load_falls_back_to_empty_with_banner() {
        let loaded = load_catalog_or_empty(&Fixed(None)).await;
        assert!(loaded.catalog.is_empty());
        assert_eq!(loaded.banner.as_deref(), Some(CATALOG_UNAVAILABLE_BANNER));
    }
}
