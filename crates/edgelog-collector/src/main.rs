mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edgelog_domain::{AppLogEmitHandler, Dispatcher, HttpEmitHandler, KindHandler, TcpEmitHandler};
use edgelog_grpc::{run_grpc_server, GrpcServerConfig};
use edgelog_runner::Runner;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let config = match config::CollectorConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting edgelog collector version {}", VERSION);

    let runner = Runner::new()
        .with_process({
            let config = config.clone();
            move |ctx| Box::pin(async move { serve(ctx, config).await })
        })
        .with_closer(|| {
            Box::pin(async move {
                info!("Collector stopped");
                Ok(())
            })
        })
        .with_drain_timeout(Duration::from_secs(config.drain_timeout_secs))
        .with_closer_timeout(Duration::from_secs(config.closer_timeout_secs));

    runner.run().await;
}

async fn serve(ctx: CancellationToken, config: config::CollectorConfig) -> Result<()> {
    let handlers: Vec<Arc<dyn KindHandler>> = vec![
        Arc::new(HttpEmitHandler::new()),
        Arc::new(TcpEmitHandler::new()),
        Arc::new(AppLogEmitHandler::new()),
    ];
    let dispatcher = Arc::new(Dispatcher::new(handlers)?);

    run_grpc_server(
        GrpcServerConfig {
            host: config.host,
            port: config.port,
        },
        dispatcher,
        ctx,
    )
    .await
}
