//! Basic example of using the edgelog runner
//!
//! Demonstrates concurrent processes, graceful shutdown on Ctrl+C, the
//! bounded drain window, and cleanup closers.
//!
//! Run with: cargo run --example basic_runner

use edgelog_runner::Runner;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting runner example, press Ctrl+C to shut down");

    let runner = Runner::new()
        // Ticker that stops cooperatively on shutdown
        .with_process(|ctx| async move {
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!(ticks, "ticker stopping gracefully");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        ticks += 1;
                        tracing::info!(ticks, "tick");
                    }
                }
            }
            Ok(())
        })
        // Worker that takes a moment to unwind once cancelled
        .with_process(|ctx| async move {
            ctx.cancelled().await;
            tracing::info!("worker draining...");
            tokio::time::sleep(Duration::from_millis(500)).await;
            tracing::info!("worker drained");
            Ok(())
        })
        .with_closer(|| async move {
            tracing::info!("flushing buffers");
            Ok(())
        })
        .with_drain_timeout(Duration::from_secs(5))
        .with_closer_timeout(Duration::from_secs(2));

    runner.run().await;
}
