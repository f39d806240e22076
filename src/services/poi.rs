// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browsing points of interest.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::models::PointOfInterest;

#[derive(Clone)]
pub struct PoiService {
    store: DataStore,
}

impl PoiService {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// Every point of interest, or only those of `poi_type`.
    pub async fn list(&self, poi_type: Option<&str>) -> Result<Vec<PointOfInterest>, StoreError> {
        let filter = match poi_type {
            Some(t) => Filter::all().eq("type", t),
            None => Filter::all(),
        };
        self.store
            .get_as(collections::POINTS_OF_INTEREST, &filter)
            .await
    }

    /// Distinct, non-empty types in first-seen order.
    pub async fn types(&self) -> Result<Vec<String>, StoreError> {
        let mut types: Vec<String> = Vec::new();
        for poi in self.list(None).await? {
            match poi.poi_type {
                Some(t) if !t.is_empty() && !types.contains(&t) => types.push(t),
                _ => {}
            }
        }
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store_with_pois() -> DataStore {
        let store = DataStore::in_memory();
        for (id, name, poi_type) in [
            ("a", "Tour Eiffel", json!("monument")),
            ("b", "Jardin du Luxembourg", json!("parc")),
            ("c", "Sacré-Cœur", json!("monument")),
            ("d", "Fontaine", json!(null)),
            ("e", "Kiosque", json!("")),
        ] {
            store
                .insert(
                    collections::POINTS_OF_INTEREST,
                    json!({
                        "id": id,
                        "name": name,
                        "type": poi_type,
                        "latitude": 48.86,
                        "longitude": 2.35
                    }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let pois = PoiService::new(store_with_pois().await);

        assert_eq!(pois.list(None).await.unwrap().len(), 5);

        let monuments = pois.list(Some("monument")).await.unwrap();
        let names: Vec<&str> = monuments.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Tour Eiffel", "Sacré-Cœur"]);

        assert!(pois.list(Some("plage")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_types_are_distinct() {
        let pois = PoiService::new(store_with_pois().await);
        assert_eq!(pois.types().await.unwrap(), vec!["monument", "parc"]);
    }

    #[tokio::test]
    async fn test_store_down() {
        let store = store_with_pois().await;
        store
            .memory()
            .unwrap()
            .set_unavailable(collections::POINTS_OF_INTEREST, true);
        assert!(PoiService::new(store).types().await.is_err());
    }
}
