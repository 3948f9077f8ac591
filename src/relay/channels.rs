//! Event-loop channel wiring.
//!
//! Groups the channels connecting the update poller, the event loop and the
//! shutdown signal.

use tokio::sync::{mpsc, watch};

use crate::common::InboundEvent;

/// Channels owned by the platform poller.
pub struct PollerChannels {
    /// Sender for inbound platform events.
    pub event_tx: mpsc::UnboundedSender<InboundEvent>,
    /// Receiver for the shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels owned by the event loop.
pub struct LoopChannels {
    /// Receiver for inbound platform events.
    pub event_rx: mpsc::UnboundedReceiver<InboundEvent>,
    /// Receiver for the shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels created at startup.
pub struct ChannelBundle {
    pub poller: PollerChannels,
    pub event_loop: LoopChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            poller: PollerChannels {
                event_tx,
                shutdown_rx: shutdown_rx.clone(),
            },
            event_loop: LoopChannels {
                event_rx,
                shutdown_rx,
            },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
