use tracing::{debug, info};

use crate::error::HandlerError;
use crate::record::{RecordBatch, RecordKind};

/// Per-kind processing routine invoked after classification.
///
/// Implementations must process records in receipt order and must not
/// block the caller indefinitely: invocation is synchronous with respect
/// to the session's receive loop, so long-running work belongs on a task
/// the handler hands off to itself. Handlers may share process-wide sinks;
/// their own synchronization owns correctness under concurrent sessions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait KindHandler: Send + Sync {
    /// The payload kind this handler accepts.
    fn kind(&self) -> RecordKind;

    /// Process one batch of records of `self.kind()`.
    fn handle(&self, batch: &RecordBatch) -> Result<(), HandlerError>;
}

fn wrong_kind(expected: RecordKind, batch: &RecordBatch) -> HandlerError {
    HandlerError::new(format!(
        "expected {} batch, got {}",
        expected,
        batch.kind()
    ))
}

/// Emits one structured event per HTTP access log entry.
#[derive(Debug, Default)]
pub struct HttpEmitHandler;

impl HttpEmitHandler {
    pub fn new() -> Self {
        Self
    }
}

impl KindHandler for HttpEmitHandler {
    fn kind(&self) -> RecordKind {
        RecordKind::Http
    }

    fn handle(&self, batch: &RecordBatch) -> Result<(), HandlerError> {
        let RecordBatch::Http(records) = batch else {
            return Err(wrong_kind(RecordKind::Http, batch));
        };

        debug!(count = records.len(), "processing http access log batch");
        for record in records {
            info!(
                method = record.method.as_deref(),
                path = record.path.as_deref(),
                authority = record.authority.as_deref(),
                response_code = record.response_code,
                user_agent = record.user_agent.as_deref(),
                request_bytes = record.request_body_bytes,
                response_bytes = record.response_body_bytes,
                downstream = record.downstream_remote_address.as_deref(),
                upstream_cluster = record.upstream_cluster.as_deref(),
                "http access log entry"
            );
        }
        Ok(())
    }
}

/// Emits one structured event per TCP access log entry.
#[derive(Debug, Default)]
pub struct TcpEmitHandler;

impl TcpEmitHandler {
    pub fn new() -> Self {
        Self
    }
}

impl KindHandler for TcpEmitHandler {
    fn kind(&self) -> RecordKind {
        RecordKind::Tcp
    }

    fn handle(&self, batch: &RecordBatch) -> Result<(), HandlerError> {
        let RecordBatch::Tcp(records) = batch else {
            return Err(wrong_kind(RecordKind::Tcp, batch));
        };

        debug!(count = records.len(), "processing tcp access log batch");
        for record in records {
            info!(
                downstream = record.downstream_remote_address.as_deref(),
                upstream_cluster = record.upstream_cluster.as_deref(),
                received_bytes = record.received_bytes,
                sent_bytes = record.sent_bytes,
                "tcp access log entry"
            );
        }
        Ok(())
    }
}

/// Emits one structured event per exported application log record.
#[derive(Debug, Default)]
pub struct AppLogEmitHandler;

impl AppLogEmitHandler {
    pub fn new() -> Self {
        Self
    }
}

impl KindHandler for AppLogEmitHandler {
    fn kind(&self) -> RecordKind {
        RecordKind::AppLog
    }

    fn handle(&self, batch: &RecordBatch) -> Result<(), HandlerError> {
        let RecordBatch::AppLog(records) = batch else {
            return Err(wrong_kind(RecordKind::AppLog, batch));
        };

        // Batch-level scope summary, then one event per record
        let scope = records.first().and_then(|r| r.scope.as_deref());
        let schema_url = records.first().and_then(|r| r.schema_url.as_deref());
        debug!(
            scope,
            schema_url,
            num_records = records.len(),
            "processing app log batch"
        );
        for record in records {
            info!(
                scope = record.scope.as_deref(),
                severity = record.severity.as_deref(),
                body = record.body.as_deref(),
                attributes = record.attribute_count,
                observed_at = ?record.observed_at,
                "app log record"
            );
        }
        Ok(())
    }
}
