//! Long-polling update loop.
//!
//! Pulls updates from the Bot API, records every chat it sees in the
//! client's directory and forwards relay-relevant events to the event loop.
//! Transport failures back off exponentially and never end the loop.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::telegram::TelegramClient;
use super::wire::Update;
use crate::common::InboundEvent;
use crate::relay::channels::PollerChannels;

/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn poll_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(Duration::from_secs(300))
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    timeout_secs: u64,
    drop_pending: bool,
    event_tx: mpsc::UnboundedSender<InboundEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl UpdatePoller {
    pub fn new(
        client: Arc<TelegramClient>,
        timeout_secs: u64,
        drop_pending: bool,
        channels: PollerChannels,
    ) -> Self {
        Self {
            client,
            timeout_secs,
            drop_pending,
            event_tx: channels.event_tx,
            shutdown_rx: channels.shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        tokio::select! {
            _ = self.poll_loop() => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            } => {
                info!("Shutdown signal received, stopping update polling");
            }
        }
        info!("Update poller ended");
    }

    async fn poll_loop(&mut self) {
        let mut offset = if self.drop_pending {
            self.skip_pending().await
        } else {
            None
        };
        let mut backoff = poll_backoff();

        loop {
            match self.client.get_updates(offset, self.timeout_secs).await {
                Ok(updates) => {
                    backoff = poll_backoff();
                    if let Some(next) = next_offset(&updates) {
                        offset = Some(next);
                    }
                    if !self.forward(updates) {
                        debug!("Event channel closed, stopping poller");
                        break;
                    }
                }
                Err(e) => {
                    error!("Polling for updates failed: {}", e);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                    sleep(delay).await;
                }
            }
        }
    }

    /// Acknowledge everything queued before startup. Returns the offset to resume from.
    async fn skip_pending(&self) -> Option<i64> {
        match self.client.get_updates(Some(-1), 0).await {
            Ok(updates) => {
                let next = next_offset(&updates);
                if next.is_some() {
                    info!("Dropped updates queued while offline");
                }
                next
            }
            Err(e) => {
                warn!("Could not drop pending updates: {}", e);
                None
            }
        }
    }

    /// Returns false once the receiving side is gone.
    fn forward(&self, updates: Vec<Update>) -> bool {
        for update in updates {
            self.client.observe(update.observed_chats());
            let update_id = update.update_id;
            match update.into_event() {
                Some(event) => {
                    if self.event_tx.send(event).is_err() {
                        return false;
                    }
                }
                None => debug!("Ignoring update {}", update_id),
            }
        }
        true
    }
}

fn next_offset(updates: &[Update]) -> Option<i64> {
    updates.iter().map(|u| u.update_id).max().map(|id| id + 1)
}
