//! chanrelay - Telegram channel relay
//!
//! Copies posts from configured source chats into per-route destination
//! channels, keeps reply threads intact across the copy and follows every
//! relayed text with a machine translation.

mod common;
mod config;
mod menu;
mod platform;
mod relay;
mod translate;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use common::error::AppError;
use common::{ChannelId, InboundEvent};
use config::{env::get_config_path, load_and_validate, Config};
use menu::MenuHandler;
use platform::telegram::seed_directory;
use platform::{TelegramClient, UpdatePoller};
use relay::{ChannelBundle, ContentFilter, HandlerRegistry, MappingStore, RelayControl, RelayPipeline, RoutingTable};
use translate::{OpenAiTranslator, Translator};

/// Everything the event loop needs once startup succeeded.
struct Relay {
    client: Arc<TelegramClient>,
    registry: Arc<HandlerRegistry>,
    menu: Option<Arc<MenuHandler>>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("chanrelay v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    let storage = config.storage();
    info!("Configuration loaded successfully");
    info!("  Routes: {}", config.routes.len());
    info!("  Routing file: {}", storage.routing_file());
    info!("  Mappings file: {}", storage.mappings_file());
    info!(
        "  Translation: {}",
        if config.translation.enabled() {
            config.translation.language()
        } else {
            "disabled"
        }
    );

    let relay = start(&config).await.map_err(|e| {
        error!("Startup failed: {}", e);
        e
    })?;

    let channels = ChannelBundle::new();
    let shutdown_tx = channels.control.shutdown_tx;

    let poller = UpdatePoller::new(
        relay.client.clone(),
        config.telegram.poll_timeout_secs(),
        config.telegram.drop_pending_updates(),
        channels.poller,
    );
    let mut poller_task = tokio::spawn(poller.run());

    let event_loop = tokio::spawn(run_events(
        relay,
        channels.event_loop.event_rx,
        channels.event_loop.shutdown_rx,
    ));

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping...");
            true
        }
        _ = &mut poller_task => false,
        _ = event_loop => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (tasks already exited): {}", e);
        }
        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, poller_task).await {
            Ok(Ok(())) => info!("Update poller stopped"),
            Ok(Err(e)) => warn!("Update poller task panicked: {}", e),
            Err(_) => warn!("Update poller did not stop in time"),
        }
    }

    info!("Exiting...");
    Ok(())
}

/// Load documents, connect to Telegram and bind the routing table.
async fn start(config: &Config) -> std::result::Result<Relay, AppError> {
    let storage = config.storage();

    let filter = ContentFilter::load(Path::new(storage.blocked_terms_file()))?;
    if filter.is_empty() {
        warn!("No blocked terms loaded, every message will be relayed");
    } else {
        info!("Loaded {} blocked term(s)", filter.len());
    }

    let mappings = Arc::new(MappingStore::load(storage.mappings_file())?);
    let table = Arc::new(RoutingTable::load(storage.routing_file(), &config.routes)?);

    let client = Arc::new(TelegramClient::new(&config.telegram, storage.media_dir())?);
    let me = client.get_me().await?;
    info!(
        "Connected to Telegram as @{} ({})",
        me.username.as_deref().unwrap_or("unknown"),
        me.id
    );

    let known: BTreeSet<ChannelId> = table
        .with_routes(|routes| {
            routes
                .iter()
                .flat_map(|r| r.active_sources().chain(std::iter::once(r.destination)))
                .collect()
        })
        .await;
    seed_directory(&client, known).await;

    let translator: Option<Arc<dyn Translator>> = if config.translation.enabled() {
        Some(Arc::new(OpenAiTranslator::new(&config.translation)?))
    } else {
        None
    };

    let pipeline = Arc::new(RelayPipeline::new(
        client.clone(),
        translator,
        mappings,
        filter,
        config.rejection_notice(),
    ));
    let registry = Arc::new(HandlerRegistry::new(pipeline));
    let generation = registry.rebind(&table).await;
    info!("Relay handlers bound (generation {})", generation);

    let menu = if config.menu_enabled() {
        let control = RelayControl::new(table, registry.clone(), client.clone());
        Some(Arc::new(MenuHandler::new(
            control,
            client.clone(),
            config.menu_admins(),
        )))
    } else {
        info!("Inline menu disabled");
        None
    };

    Ok(Relay {
        client,
        registry,
        menu,
    })
}

/// Route inbound events to the menu or the relay. Each event runs in its own task.
async fn run_events(
    relay: Relay,
    mut event_rx: mpsc::UnboundedReceiver<InboundEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(InboundEvent::Message(message)) => match &relay.menu {
                        Some(menu) if menu.wants(&message) => {
                            let menu = Arc::clone(menu);
                            tokio::spawn(async move {
                                if let Err(e) = menu.open(&message).await {
                                    warn!("Failed to open menu: {}", e);
                                }
                            });
                        }
                        _ => {
                            relay.registry.dispatch(message);
                        }
                    },
                    Some(InboundEvent::Callback(press)) => match &relay.menu {
                        Some(menu) => {
                            let menu = Arc::clone(menu);
                            tokio::spawn(async move {
                                if let Err(e) = menu.handle_callback(&press).await {
                                    warn!("Failed to handle menu press: {}", e);
                                }
                            });
                        }
                        None => debug!("Ignoring button press while the menu is disabled"),
                    },
                    None => {
                        debug!("Event channel closed.");
                        break;
                    }
                }
            }

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signal received, stopping event processing");
                    break;
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
