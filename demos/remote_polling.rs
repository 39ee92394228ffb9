//! Example demonstrating scheduled polling of a remote properties endpoint.
//!
//! Point `CONFIG_URL` at any endpoint serving a `.properties` body, e.g.
//! `python3 -m http.server` in a directory containing `app.properties`:
//!
//! ```bash
//! CONFIG_URL=http://localhost:8000/app.properties cargo run --example remote_polling
//! ```

use polling_config::prelude::*;
use polling_config::sources::HttpSource;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Remote Polling Example ===\n");

    let url = std::env::var("CONFIG_URL")
        .unwrap_or_else(|_| "http://localhost:8000/app.properties".to_string());

    let source = HttpSource::builder()
        .with_url(url.clone())
        .with_timeout(Duration::from_secs(5))
        .build()?;

    let config = PollingDynamicConfig::builder()
        .with_source(source)
        .with_strategy(ScheduledPollingStrategy::fixed(Duration::from_secs(2)))
        .with_observer(Arc::new(
            ObserverFn::new()
                .with_key_update(|key, snapshot| {
                    let value = snapshot.get_string_or(key, "<removed>").unwrap_or_default();
                    println!("  {} = {}", key, value);
                })
                .with_error(|error, _| println!("  poll failed: {}", error)),
        ))
        .build()
        .await?;

    println!("Polling {} every 2 seconds for 20 seconds...\n", url);
    tokio::time::sleep(Duration::from_secs(20)).await;

    println!("\nFinal keys: {:?}", config.keys());
    config.shutdown();
    Ok(())
}
