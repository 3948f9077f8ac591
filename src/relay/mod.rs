//! Relay and mapping engine.
//!
//! ## Module Structure
//!
//! - `filter`: disallowed-term matching (`ContentFilter`)
//! - `dedup`: per-process duplicate suppression (`DuplicateGuard`)
//! - `mapping`: persistent source -> destination message map (`MappingStore`)
//! - `routing`: named routes and their source lists (`RoutingTable`)
//! - `pipeline`: the per-message relay protocol (`RelayPipeline`)
//! - `registry`: binds inbound events to routes (`HandlerRegistry`)
//! - `reconfig`: the runtime editing surface (`RelayControl`)
//! - `channels`: event-loop channel wiring

pub mod channels;
pub mod dedup;
pub mod filter;
pub mod mapping;
pub mod pipeline;
pub mod reconfig;
pub mod registry;
pub mod routing;

#[cfg(test)]
pub(crate) mod testing;

pub use channels::ChannelBundle;
pub use filter::ContentFilter;
pub use mapping::MappingStore;
pub use pipeline::{Delivery, RelayOutcome, RelayPipeline};
pub use reconfig::RelayControl;
pub use registry::HandlerRegistry;
pub use routing::{Route, RoutingTable};
