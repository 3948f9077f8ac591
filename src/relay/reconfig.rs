//! Reconfiguration surface used by the interactive menu.
//!
//! Every successful edit is persisted by the routing table and immediately
//! followed by a registry rebind, so new rules apply without a restart.

use std::sync::Arc;

use tracing::info;

use crate::common::error::ReconfigError;
use crate::common::types::{ChannelId, ChannelInfo};
use crate::platform::MessagingPlatform;

use super::registry::HandlerRegistry;
use super::routing::{Route, RoutingTable};

#[derive(Clone)]
pub struct RelayControl {
    table: Arc<RoutingTable>,
    registry: Arc<HandlerRegistry>,
    platform: Arc<dyn MessagingPlatform>,
}

impl RelayControl {
    pub fn new(
        table: Arc<RoutingTable>,
        registry: Arc<HandlerRegistry>,
        platform: Arc<dyn MessagingPlatform>,
    ) -> Self {
        Self {
            table,
            registry,
            platform,
        }
    }

    pub async fn list_routes(&self) -> Vec<Route> {
        self.table.list_routes().await
    }

    pub async fn get_route(&self, name: &str) -> Result<Route, ReconfigError> {
        self.table.get_route(name).await
    }

    /// Assign a source slot, persist, and rebind.
    pub async fn set_source_at(
        &self,
        name: &str,
        index: usize,
        channel: ChannelId,
    ) -> Result<Route, ReconfigError> {
        let route = self.table.set_source_at(name, index, channel).await?;
        let generation = self.registry.rebind(&self.table).await;
        info!(route = %name, generation, "Routing updated");
        Ok(route)
    }

    /// Chats the relay can see, offered as choices in the menu.
    pub async fn list_available_channels(&self) -> Result<Vec<ChannelInfo>, ReconfigError> {
        Ok(self.platform.list_channels().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::messages::text_message;
    use crate::relay::filter::ContentFilter;
    use crate::relay::mapping::MappingStore;
    use crate::relay::pipeline::RelayPipeline;
    use crate::relay::routing::route;
    use crate::relay::testing::FakePlatform;

    struct Fixture {
        platform: Arc<FakePlatform>,
        registry: Arc<HandlerRegistry>,
        control: RelayControl,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::new(901, dir.path()));
        let mappings = Arc::new(MappingStore::load(dir.path().join("m.json")).unwrap());
        let pipeline = Arc::new(RelayPipeline::new(
            platform.clone(),
            None,
            mappings,
            ContentFilter::empty(),
            "blocked",
        ));
        let registry = Arc::new(HandlerRegistry::new(pipeline));
        let table = Arc::new(RoutingTable::from_routes(
            dir.path().join("routes.json"),
            vec![
                route("set_1", -100222, &[Some(-100111)]),
                route("set_2", -100333, &[Some(-100444)]),
            ],
        ));
        let control = RelayControl::new(table.clone(), registry.clone(), platform.clone());
        Fixture {
            platform,
            registry,
            control,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_set_source_rebinds_immediately() {
        let f = fixture();
        f.registry.bind(&f.control.list_routes().await);
        let x = ChannelId(-100777);
        assert!(f.registry.deliveries_for(x).is_empty());

        f.control.set_source_at("set_1", 2, x).await.unwrap();

        let deliveries = f.registry.deliveries_for(x);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].destination, ChannelId(-100222));

        for handle in f.registry.dispatch(text_message(x.get(), 10, "hi")) {
            handle.await.unwrap();
        }
        assert_eq!(f.platform.sent_to(ChannelId(-100222)).len(), 1);
        assert!(f.platform.sent_to(ChannelId(-100333)).is_empty());
    }

    #[tokio::test]
    async fn test_replaced_source_no_longer_routes() {
        let f = fixture();
        f.registry.bind(&f.control.list_routes().await);

        f.control.set_source_at("set_1", 0, ChannelId(-100888)).await.unwrap();

        assert!(f.registry.deliveries_for(ChannelId(-100111)).is_empty());
        assert_eq!(f.registry.deliveries_for(ChannelId(-100888)).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_edit_does_not_rebind() {
        let f = fixture();
        let generation = f.registry.bind(&f.control.list_routes().await);

        assert!(f.control.set_source_at("nope", 0, ChannelId(-1)).await.is_err());
        assert_eq!(f.registry.snapshot().unwrap().generation, generation);
    }

    #[tokio::test]
    async fn test_list_available_channels_comes_from_platform() {
        let f = fixture();
        f.platform.set_channels(vec![(-100111, "Alpha"), (-100444, "Beta")]);

        let channels = f.control.list_available_channels().await.unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].title, "Alpha");
    }
}
