use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{error, info};

use edgelog_domain::{Dispatcher, LogExportService, StreamSession};
use envoy_types::pb::envoy::service::accesslog::v3::access_log_service_server::AccessLogServiceServer;
use opentelemetry_proto::tonic::collector::logs::v1::logs_service_server::LogsServiceServer;

use crate::access_log_handler::AccessLogServiceHandler;
use crate::logs_handler::LogsServiceHandler;

/// gRPC server configuration
pub struct GrpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GrpcServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Run the gRPC server with graceful shutdown
pub async fn run_grpc_server(
    config: GrpcServerConfig,
    dispatcher: Arc<Dispatcher>,
    cancellation_token: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid server address {}:{}", config.host, config.port))?;

    info!("Starting gRPC server on {}", addr);

    // Create handlers; both entry points share one dispatcher
    let access_log_handler = AccessLogServiceHandler::new(
        Arc::new(StreamSession::new(dispatcher.clone())),
        cancellation_token.clone(),
    );
    let logs_handler = LogsServiceHandler::new(Arc::new(LogExportService::new(dispatcher)));

    // Build server with graceful shutdown
    let server = Server::builder()
        .add_service(AccessLogServiceServer::new(access_log_handler))
        .add_service(LogsServiceServer::new(logs_handler))
        .serve_with_shutdown(addr, async move {
            cancellation_token.cancelled().await;
            info!("gRPC server shutdown signal received");
        });

    match server.await {
        Ok(_) => {
            info!("gRPC server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("gRPC server error: {}", e);
            Err(e.into())
        }
    }
}
