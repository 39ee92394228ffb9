//! Example demonstrating manually driven polling with observers.
//!
//! This example shows how to:
//! - Drive polls yourself with `ManualPollingStrategy`
//! - Receive whole-config and per-key notifications
//! - Keep serving the last good snapshot while a source fails
//!
//! Run with: cargo run --example manual_polling

use polling_config::prelude::*;
use polling_config::sources::MemorySource;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Manual Polling Example ===\n");

    let defaults = MemorySource::new("defaults");
    defaults.set("server.port", "8080");
    defaults.set("feature.new_ui", "false");

    let overrides = MemorySource::new("overrides");
    overrides.set("feature.new_ui", "true");

    let observer = ObserverFn::new()
        .with_key_update(|key, snapshot| {
            println!("[observer] {} changed (version {})", key, snapshot.version());
        })
        .with_update(|snapshot| {
            println!("[observer] snapshot {} published with {} keys", snapshot.version(), snapshot.len());
        })
        .with_error(|error, snapshot| {
            println!("[observer] poll failed: {} (still serving version {})", error, snapshot.version());
        });

    let strategy = ManualPollingStrategy::new();
    let config = PollingDynamicConfig::builder()
        .with_source(defaults.clone())
        .with_source(overrides.clone())
        .with_strategy(strategy.clone())
        .with_observer(Arc::new(observer))
        .build()
        .await?;

    println!("State before first poll: {:?}", config.state());
    println!("Port with default: {}\n", config.get_i64_or("server.port", 80)?);

    println!("Polling...");
    strategy.fire().await;
    println!("Port: {}", config.get_i64("server.port")?);
    println!("New UI enabled: {}\n", config.get_bool("feature.new_ui")?);

    println!("Changing the port and removing the override...");
    defaults.set("server.port", "9090");
    overrides.remove("feature.new_ui");
    strategy.fire().await;
    println!("Port: {}", config.get_i64("server.port")?);
    println!("New UI enabled: {}\n", config.get_bool("feature.new_ui")?);

    println!("Simulating an outage of the overrides source...");
    overrides.fail_with_status(Some(503));
    defaults.set("server.port", "7070");
    strategy.fire().await;
    println!("Port (last good value): {}\n", config.get_i64("server.port")?);

    println!("Recovering...");
    overrides.fail_with_status(None);
    strategy.fire().await;
    println!("Port: {}", config.get_i64("server.port")?);

    config.shutdown();
    println!("\n=== Example Complete ===");
    Ok(())
}
