use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, info};

use edgelog_domain::LogExportService;
use opentelemetry_proto::tonic::collector::logs::v1::logs_service_server::LogsService;
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsPartialSuccess, ExportLogsServiceRequest, ExportLogsServiceResponse,
};

use crate::conversions::to_export_batch;

/// gRPC handler for the OTLP logs export service.
pub struct LogsServiceHandler {
    export_service: Arc<LogExportService>,
}

impl LogsServiceHandler {
    pub fn new(export_service: Arc<LogExportService>) -> Self {
        Self { export_service }
    }
}

#[tonic::async_trait]
impl LogsService for LogsServiceHandler {
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        let batch = to_export_batch(request.into_inner());
        debug!(groups = batch.groups.len(), "Received export logs request");

        let summary = self.export_service.export(batch);
        info!(
            accepted = summary.accepted_records,
            rejected = summary.rejected_records,
            "Export logs request processed"
        );

        // OTLP convention: the call succeeds, rejected records are
        // reported through partial_success
        let partial_success = summary.has_rejections().then(|| ExportLogsPartialSuccess {
            rejected_log_records: summary.rejected_records as i64,
            error_message: summary.failures.join("; "),
        });

        Ok(Response::new(ExportLogsServiceResponse { partial_success }))
    }
}
