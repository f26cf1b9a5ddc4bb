use std::fmt;

use chrono::{DateTime, Utc};

/// Closed set of payload kinds the collector understands.
///
/// Adding a kind here forces every match over it to be revisited; the
/// dispatch path never routes on anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// HTTP access log entries pushed by an edge proxy.
    Http,
    /// TCP access log entries pushed by an edge proxy.
    Tcp,
    /// Application log records exported by a telemetry agent.
    AppLog,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Http => "http",
            RecordKind::Tcp => "tcp",
            RecordKind::AppLog => "app_log",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded HTTP access log entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpAccessRecord {
    pub method: Option<String>,
    pub path: Option<String>,
    pub authority: Option<String>,
    pub user_agent: Option<String>,
    pub response_code: Option<u32>,
    pub request_body_bytes: u64,
    pub response_body_bytes: u64,
    pub downstream_remote_address: Option<String>,
    pub upstream_cluster: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

/// One decoded TCP access log entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TcpAccessRecord {
    pub downstream_remote_address: Option<String>,
    pub upstream_cluster: Option<String>,
    pub received_bytes: u64,
    pub sent_bytes: u64,
    pub start_time: Option<DateTime<Utc>>,
}

/// One decoded application log record from an export request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppLogRecord {
    pub scope: Option<String>,
    pub schema_url: Option<String>,
    pub severity: Option<String>,
    pub body: Option<String>,
    pub attribute_count: usize,
    pub observed_at: Option<DateTime<Utc>>,
}

/// An ordered batch of records of exactly one kind.
///
/// Record order is receipt order and must survive dispatch untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    Http(Vec<HttpAccessRecord>),
    Tcp(Vec<TcpAccessRecord>),
    AppLog(Vec<AppLogRecord>),
}

impl RecordBatch {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordBatch::Http(_) => RecordKind::Http,
            RecordBatch::Tcp(_) => RecordKind::Tcp,
            RecordBatch::AppLog(_) => RecordKind::AppLog,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Http(records) => records.len(),
            RecordBatch::Tcp(records) => records.len(),
            RecordBatch::AppLog(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
