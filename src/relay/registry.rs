//! Handler registry: binds inbound events to the current routing table.
//!
//! States are `Unbound` and `Bound(snapshot)`. Binding swaps the whole set of
//! subscriptions in one synchronous step, so every inbound event is matched
//! against exactly one snapshot, either the old one or the new one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::common::types::ChannelId;
use crate::common::InboundMessage;

use super::pipeline::{Delivery, RelayPipeline};
use super::routing::{Route, RoutingTable};

/// One route's filter on the inbound stream.
#[derive(Debug, Clone)]
pub struct Subscription {
    sources: HashSet<ChannelId>,
    pub delivery: Delivery,
}

impl Subscription {
    fn from_route(route: &Route) -> Self {
        Self {
            sources: route.active_sources().collect(),
            delivery: Delivery {
                route: route.name.clone(),
                destination: route.destination,
                translate: route.translate,
            },
        }
    }

    pub fn matches(&self, chat: ChannelId) -> bool {
        self.sources.contains(&chat)
    }
}

/// An immutable set of subscriptions.
#[derive(Debug)]
pub struct Binding {
    pub generation: u64,
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug)]
enum RegistryState {
    Unbound,
    Bound(Arc<Binding>),
}

/// Routes inbound messages to relay pipelines according to the bound snapshot.
pub struct HandlerRegistry {
    pipeline: Arc<RelayPipeline>,
    state: RwLock<RegistryState>,
    generation: AtomicU64,
}

impl HandlerRegistry {
    pub fn new(pipeline: Arc<RelayPipeline>) -> Self {
        Self {
            pipeline,
            state: RwLock::new(RegistryState::Unbound),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace all subscriptions with one per route. Returns the new generation.
    pub fn bind(&self, routes: &[Route]) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let binding = Arc::new(Binding {
            generation,
            subscriptions: routes.iter().map(Subscription::from_route).collect(),
        });

        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = match &*state {
            RegistryState::Bound(old) => old.subscriptions.len(),
            RegistryState::Unbound => 0,
        };
        *state = RegistryState::Bound(binding.clone());
        drop(state);

        info!(
            generation,
            "Bound {} subscription(s) (revoked {})",
            binding.subscriptions.len(),
            previous
        );
        for sub in &binding.subscriptions {
            debug!(
                route = %sub.delivery.route,
                destination = %sub.delivery.destination,
                "Subscribed to {:?}",
                sub.sources
            );
        }
        generation
    }

    /// Re-bind to the table's current routes.
    ///
    /// The table stays read-locked while binding, so a concurrent edit can
    /// only land before this snapshot or after this bind.
    pub async fn rebind(&self, table: &RoutingTable) -> u64 {
        table.with_routes(|routes| self.bind(routes)).await
    }

    pub fn snapshot(&self) -> Option<Arc<Binding>> {
        let state = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &*state {
            RegistryState::Bound(binding) => Some(binding.clone()),
            RegistryState::Unbound => None,
        }
    }

    /// Deliveries for a message from `chat`, all taken from a single snapshot.
    pub fn deliveries_for(&self, chat: ChannelId) -> Vec<Delivery> {
        match self.snapshot() {
            Some(binding) => binding
                .subscriptions
                .iter()
                .filter(|s| s.matches(chat))
                .map(|s| s.delivery.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Start one relay task per matching subscription.
    pub fn dispatch(&self, message: InboundMessage) -> Vec<JoinHandle<()>> {
        let deliveries = self.deliveries_for(message.chat_id);
        if deliveries.is_empty() {
            return Vec::new();
        }

        let message = Arc::new(message);
        deliveries
            .into_iter()
            .map(|delivery| {
                let pipeline = Arc::clone(&self.pipeline);
                let message = Arc::clone(&message);
                tokio::spawn(async move {
                    match pipeline.relay(&message, &delivery).await {
                        Ok(outcome) => debug!(route = %delivery.route, "Relay finished: {:?}", outcome),
                        Err(e) => error!(
                            source = %message.chat_id,
                            message_id = %message.message_id,
                            route = %delivery.route,
                            "Relay abandoned: {}",
                            e
                        ),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::messages::text_message;
    use crate::common::types::MessageId;
    use crate::relay::filter::ContentFilter;
    use crate::relay::mapping::MappingStore;
    use crate::relay::routing::route;
    use crate::relay::testing::FakePlatform;

    fn registry(dir: &std::path::Path) -> (Arc<FakePlatform>, HandlerRegistry) {
        let platform = Arc::new(FakePlatform::new(901, dir));
        let mappings = Arc::new(MappingStore::load(dir.join("m.json")).unwrap());
        let pipeline = Arc::new(RelayPipeline::new(
            platform.clone(),
            None,
            mappings,
            ContentFilter::empty(),
            "blocked",
        ));
        (platform, HandlerRegistry::new(pipeline))
    }

    #[test]
    fn test_unbound_routes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (_, registry) = registry(dir.path());
        assert!(registry.snapshot().is_none());
        assert!(registry.deliveries_for(ChannelId(-100111)).is_empty());
    }

    #[test]
    fn test_bind_filters_by_source_and_skips_holes() {
        let dir = tempfile::tempdir().unwrap();
        let (_, registry) = registry(dir.path());
        let generation = registry.bind(&[
            route("set_1", -100222, &[Some(-100111), None]),
            route("set_2", -100333, &[Some(-100444)]),
        ]);

        assert_eq!(generation, 1);
        let deliveries = registry.deliveries_for(ChannelId(-100111));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].route, "set_1");
        assert_eq!(deliveries[0].destination, ChannelId(-100222));
        assert!(registry.deliveries_for(ChannelId(-100999)).is_empty());
    }

    #[test]
    fn test_rebind_revokes_old_subscriptions() {
        let dir = tempfile::tempdir().unwrap();
        let (_, registry) = registry(dir.path());
        registry.bind(&[route("set_1", -100222, &[Some(-100111)])]);
        let generation = registry.bind(&[route("set_1", -100222, &[Some(-100555)])]);

        assert_eq!(generation, 2);
        assert!(registry.deliveries_for(ChannelId(-100111)).is_empty());
        assert_eq!(registry.deliveries_for(ChannelId(-100555)).len(), 1);
        assert_eq!(registry.snapshot().unwrap().generation, 2);
    }

    #[test]
    fn test_overlapping_routes_both_match() {
        let dir = tempfile::tempdir().unwrap();
        let (_, registry) = registry(dir.path());
        registry.bind(&[
            route("set_1", -100222, &[Some(-100111)]),
            route("set_2", -100333, &[Some(-100111)]),
        ]);

        assert_eq!(registry.deliveries_for(ChannelId(-100111)).len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_routes_relay_once_to_first_route() {
        let dir = tempfile::tempdir().unwrap();
        let (platform, registry) = registry(dir.path());
        registry.bind(&[
            route("set_1", -100222, &[Some(-100111)]),
            route("set_2", -100333, &[Some(-100111)]),
        ]);

        let handles = registry.dispatch(text_message(-100111, 55, "hello"));
        assert_eq!(handles.len(), 2);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(platform.sent_to(ChannelId(-100222)).len(), 1);
        assert!(platform.sent_to(ChannelId(-100333)).is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_relays_to_bound_destination() {
        let dir = tempfile::tempdir().unwrap();
        let (platform, registry) = registry(dir.path());
        registry.bind(&[route("set_1", -100222, &[Some(-100111)])]);

        let handles = registry.dispatch(text_message(-100111, 55, "hello"));
        assert_eq!(handles.len(), 1);
        for handle in handles {
            handle.await.unwrap();
        }

        let sent = platform.sent_to(ChannelId(-100222));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, MessageId(901));
        assert!(registry.dispatch(text_message(-100999, 56, "ignored")).is_empty());
    }
}
