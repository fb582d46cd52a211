//! Mobile Shield - Main Entry Point
//!
//! Reads JSON-line payloads (`{"category": "...", "attributes": {...}}`) from
//! stdin and runs them through the dispatcher.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;

use mobile_shield_core::constants::{APP_NAME, APP_VERSION};
use mobile_shield_core::logic::native_guard;
use mobile_shield_core::logic::telemetry::{FileBackend, MemoryBackend};
use mobile_shield_core::{AppConfig, Dispatcher, EventStore, LogDisplay, PolicyEngine, RawPayload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    native_guard::install_fault_observer();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let store = if config.persist_events {
        Arc::new(EventStore::open(FileBackend::new(&config.store_dir, &config.store_key)))
    } else {
        Arc::new(EventStore::open(MemoryBackend::new()))
    };

    let runtime = tokio::runtime::Handle::current();
    let engine = Arc::new(PolicyEngine::new(config.policy.clone(), runtime.clone()));
    let dispatcher = Arc::new(
        Dispatcher::new(Arc::new(LogDisplay), runtime)
            .with_store(store.clone())
            .with_policy_engine(engine),
    );

    // stdin is read on a blocking thread, the way a vendor SDK delivers events.
    // Deliveries are settled as they arrive.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let reader = dispatcher.clone();
    let input = tokio::task::spawn_blocking(move || {
        for (n, line) in std::io::stdin().lock().lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawPayload>(&line) {
                Ok(payload) => {
                    let delivery = reader.deliver(payload);
                    if delivery.is_pending() && tx.send(delivery).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("Line {}: invalid payload ignored: {}", n + 1, e),
            }
        }
    });

    while let Some(delivery) = rx.recv().await {
        delivery.settled().await;
    }
    input.await.context("Input reader failed")?;

    let stats = dispatcher.stats();
    log::info!(
        "Done: {} received, {} dropped, {} displayed, {} suppressed",
        stats.received,
        stats.dropped,
        stats.displayed,
        stats.suppressed
    );
    for (category, count) in store.count_by_category() {
        log::info!("   {}: {}", category, count);
    }

    Ok(())
}
