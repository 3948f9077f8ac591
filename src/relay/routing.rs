//! Routing table: which source chats feed which destination.
//!
//! Routes are declared in the application config (name, label, destination).
//! Their source lists live in a separate JSON document that the menu edits at
//! runtime:
//!
//! ```json
//! { "set_1": [-1001234567890, null], "test": [] }
//! ```
//!
//! `null` marks a hole left by assigning past the end of a list.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::common::error::{ConfigError, ReconfigError};
use crate::common::persist::{read_required_json, write_json};
use crate::common::types::ChannelId;
use crate::config::types::RouteConfig;

/// Upper bound on a route's slot count, so a stray index cannot grow the list unboundedly.
pub const MAX_SOURCES_PER_ROUTE: usize = 64;

/// On-disk shape of the routing document.
pub type RoutingDocument = BTreeMap<String, Vec<Option<ChannelId>>>;

/// A named group of source chats bound to one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    /// Human label shown in the menu.
    pub label: String,
    /// Ordered source slots; `None` is an unassigned hole.
    pub sources: Vec<Option<ChannelId>>,
    pub destination: ChannelId,
    /// Whether relays on this route get a translated follow-up.
    pub translate: bool,
}

impl Route {
    pub fn from_config(config: &RouteConfig, sources: Vec<Option<ChannelId>>) -> Self {
        Self {
            name: config.name.clone(),
            label: config.label().to_string(),
            sources,
            destination: config.destination(),
            translate: config.translate(),
        }
    }

    /// Assigned source chats, holes skipped.
    pub fn active_sources(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.sources.iter().flatten().copied()
    }
}

/// Runtime-mutable routing table, persisted on every change.
#[derive(Debug)]
pub struct RoutingTable {
    path: PathBuf,
    routes: RwLock<Vec<Route>>,
}

impl RoutingTable {
    /// Load source lists for the configured routes.
    ///
    /// Every configured route must appear in the document and the document
    /// must not name routes the config does not declare.
    pub fn load(path: impl AsRef<Path>, configs: &[RouteConfig]) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let mut doc: RoutingDocument = read_required_json(&path)?;

        let unknown: Vec<&String> = doc
            .keys()
            .filter(|name| !configs.iter().any(|c| &c.name == *name))
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "{} names routes missing from the config: {:?}",
                    path.display(),
                    unknown
                ),
            });
        }

        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            let sources = doc.remove(&config.name).ok_or_else(|| ConfigError::MissingField {
                field: format!("{}: {}", path.display(), config.name),
            })?;
            routes.push(Route::from_config(config, sources));
        }

        warn_on_overlaps(&routes);
        for route in &routes {
            info!(
                route = %route.name,
                destination = %route.destination,
                "Loaded route '{}' with {} source(s)",
                route.label,
                route.active_sources().count()
            );
        }

        Ok(Self::from_routes(path, routes))
    }

    pub fn from_routes(path: PathBuf, routes: Vec<Route>) -> Self {
        Self {
            path,
            routes: RwLock::new(routes),
        }
    }

    /// All routes, in configuration order.
    pub async fn list_routes(&self) -> Vec<Route> {
        self.routes.read().await.clone()
    }

    /// Run `f` against the current routes while holding the read lock.
    pub async fn with_routes<R>(&self, f: impl FnOnce(&[Route]) -> R) -> R {
        let routes = self.routes.read().await;
        f(&routes)
    }

    pub async fn get_route(&self, name: &str) -> Result<Route, ReconfigError> {
        self.routes
            .read()
            .await
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| ReconfigError::UnknownRoute(name.to_string()))
    }

    /// Put `channel` into slot `index` of route `name`, padding with holes as needed.
    ///
    /// The whole table is persisted before the change becomes visible. On any
    /// error neither the in-memory table nor the document changes.
    pub async fn set_source_at(
        &self,
        name: &str,
        index: usize,
        channel: ChannelId,
    ) -> Result<Route, ReconfigError> {
        if index >= MAX_SOURCES_PER_ROUTE {
            return Err(ReconfigError::InvalidIndex {
                index,
                max: MAX_SOURCES_PER_ROUTE - 1,
            });
        }
        if channel.get() == 0 {
            return Err(ReconfigError::InvalidChannel(channel));
        }

        let mut routes = self.routes.write().await;
        let position = routes
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| ReconfigError::UnknownRoute(name.to_string()))?;

        let mut updated = routes.clone();
        let route = &mut updated[position];
        if route.sources.len() <= index {
            route.sources.resize(index + 1, None);
        }
        route.sources[index] = Some(channel);

        write_json(&self.path, &document(&updated), true).await?;

        warn_on_overlaps(&updated);
        let route = updated[position].clone();
        *routes = updated;

        info!(
            route = %route.name,
            "Set source slot {} to {} (now {:?})",
            index,
            channel,
            route.sources
        );
        Ok(route)
    }
}

/// Build the persisted document for a set of routes.
pub fn document(routes: &[Route]) -> RoutingDocument {
    routes
        .iter()
        .map(|r| (r.name.clone(), r.sources.clone()))
        .collect()
}

/// Assigning one chat to two routes makes both fire for the same message.
/// Not prevented, only reported.
fn warn_on_overlaps(routes: &[Route]) {
    let mut owners: HashMap<ChannelId, &str> = HashMap::new();
    for route in routes {
        for chat in route.active_sources() {
            if let Some(other) = owners.insert(chat, &route.name) {
                warn!(
                    "Chat {} is a source of both '{}' and '{}'",
                    chat, other, route.name
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn route(name: &str, destination: i64, sources: &[Option<i64>]) -> Route {
    Route {
        name: name.to_string(),
        label: name.to_string(),
        sources: sources.iter().map(|s| s.map(ChannelId)).collect(),
        destination: ChannelId(destination),
        translate: true,
    }
}
