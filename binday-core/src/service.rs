//! High-level service facade combining all providers.

use std::sync::Arc;

use crate::extract::dedup_collections;
use crate::model::{AddressQuery, BinCollection, CouncilId};
use crate::plugin::PluginRegistry;
use crate::ports::PortError;

/// Public entry point for looking up collection dates.
pub struct BindayService {
    registry: Arc<PluginRegistry>,
}

impl BindayService {
    /// Create a new service bound to the provided registry.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// List all available councils and their display names.
    #[must_use]
    pub fn councils(&self) -> Vec<(CouncilId, String)> {
        self.registry
            .councils()
            .into_iter()
            .map(|meta| (meta.id, meta.name))
            .collect()
    }

    /// Fetch the collections for a household, without duplicates and ordered by date.
    ///
    /// Collections falling on the same day keep the order the provider returned them in.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the council is unsupported or the provider call fails.
    pub async fn collections_for(
        &self,
        council: &CouncilId,
        query: &AddressQuery,
    ) -> Result<Vec<BinCollection>, PortError> {
        let plugin = self.registry.plugin(council)?;
        let collections = plugin.collection_port.collections(query).await?;

        let mut collections = dedup_collections(collections);
        collections.sort_by_key(|collection| collection.date);

        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{CouncilMeta, Councils};
    use crate::plugin::CouncilPlugin;
    use crate::ports::CollectionPort;

    struct FixedPort {
        meta: CouncilMeta,
        collections: Vec<BinCollection>,
    }

    #[async_trait]
    impl CollectionPort for FixedPort {
        fn council(&self) -> &CouncilMeta {
            &self.meta
        }

        async fn collections(&self, _query: &AddressQuery) -> Result<Vec<BinCollection>, PortError> {
            Ok(self.collections.clone())
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).expect("valid date")
    }

    fn service_with(collections: Vec<BinCollection>) -> BindayService {
        let meta = CouncilMeta {
            id: Councils::Bolton.into(),
            name: "Bolton".to_owned(),
        };
        let plugin = CouncilPlugin {
            meta: meta.clone(),
            collection_port: Arc::new(FixedPort { meta, collections }),
        };
        BindayService::new(Arc::new(PluginRegistry::new(vec![plugin])))
    }

    fn query() -> AddressQuery {
        AddressQuery::new("BL1 1AA", "12").expect("valid query")
    }

    #[tokio::test]
    async fn collections_are_deduplicated_and_sorted() {
        let service = service_with(vec![
            BinCollection::new("Grey Bin", date(21)),
            BinCollection::new("Green Bin", date(14)),
            BinCollection::new("Grey Bin", date(21)),
            BinCollection::new("Beige Bin", date(14)),
        ]);

        let collections = service
            .collections_for(&Councils::Bolton.into(), &query())
            .await
            .expect("lookup succeeds");

        assert_eq!(
            collections,
            vec![
                BinCollection::new("Green Bin", date(14)),
                BinCollection::new("Beige Bin", date(14)),
                BinCollection::new("Grey Bin", date(21)),
            ],
            "duplicates dropped, dates ascending, same-day order kept"
        );
    }

    #[tokio::test]
    async fn unknown_council_is_rejected() {
        let service = service_with(Vec::new());

        let result = service
            .collections_for(&CouncilId("wigan".to_owned()), &query())
            .await;

        assert!(
            matches!(result, Err(PortError::UnsupportedCouncil)),
            "unregistered council must fail"
        );
    }

    #[test]
    fn councils_lists_registered_plugins() {
        let service = service_with(Vec::new());
        assert_eq!(
            service.councils(),
            vec![(CouncilId("bolton".to_owned()), "Bolton".to_owned())],
            "registry should expose the single plugin"
        );
    }
}
