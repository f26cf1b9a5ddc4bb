use std::sync::Arc;

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};
use tracing::info;

use edgelog_domain::{ReceiveError, SessionEnd, StreamSession};
use envoy_types::pb::envoy::service::accesslog::v3::access_log_service_server::AccessLogService;
use envoy_types::pb::envoy::service::accesslog::v3::{
    StreamAccessLogsMessage, StreamAccessLogsResponse,
};

use crate::conversions::to_envelope;
use crate::error::session_error_to_status;

/// gRPC handler for the Envoy access log service.
///
/// Each open stream runs one session under a child of the server shutdown
/// token, so in-flight streams observe drain and unwind cooperatively
/// instead of being killed mid-dispatch.
pub struct AccessLogServiceHandler {
    session: Arc<StreamSession>,
    shutdown: CancellationToken,
}

impl AccessLogServiceHandler {
    pub fn new(session: Arc<StreamSession>, shutdown: CancellationToken) -> Self {
        Self { session, shutdown }
    }
}

#[tonic::async_trait]
impl AccessLogService for AccessLogServiceHandler {
    async fn stream_access_logs(
        &self,
        request: Request<Streaming<StreamAccessLogsMessage>>,
    ) -> Result<Response<StreamAccessLogsResponse>, Status> {
        let remote = request
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(remote = %remote, "Received new access log stream");

        let inbound = request.into_inner().map(|message| {
            message
                .map(to_envelope)
                .map_err(|status| ReceiveError::new(status.to_string()))
        });

        let summary = self
            .session
            .run(inbound, self.shutdown.child_token())
            .await
            .map_err(session_error_to_status)?;

        match summary.end {
            SessionEnd::StreamClosed => info!(
                remote = %remote,
                envelopes = summary.envelopes,
                records = summary.records,
                "Access log stream closed by client"
            ),
            SessionEnd::Cancelled => info!(
                remote = %remote,
                envelopes = summary.envelopes,
                records = summary.records,
                "Access log stream cancelled by shutdown"
            ),
        }

        Ok(Response::new(StreamAccessLogsResponse {}))
    }
}
