//! Proto → domain mapping for both ingestion surfaces.
//!
//! Conversions are total: absent or unknown proto fields degrade to
//! `None`/empty values, never to a dropped record, and an access-log
//! message without a payload becomes an explicitly unrecognized envelope.

use chrono::{DateTime, Utc};

use edgelog_domain::{
    AppLogRecord, Envelope, EnvelopePayload, ExportBatch, HttpAccessRecord, RecordBatch,
    StreamIdentity, TcpAccessRecord,
};
use envoy_types::pb::envoy::config::core::v3::{
    address, socket_address::PortSpecifier, Address, RequestMethod,
};
use envoy_types::pb::envoy::data::accesslog::v3::{
    AccessLogCommon, HttpAccessLogEntry, TcpAccessLogEntry,
};
use envoy_types::pb::envoy::service::accesslog::v3::stream_access_logs_message::{
    Identifier, LogEntries,
};
use envoy_types::pb::envoy::service::accesslog::v3::StreamAccessLogsMessage;
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{any_value, AnyValue};
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ScopeLogs, SeverityNumber};

/// Map one access-log stream message to a domain envelope.
pub fn to_envelope(message: StreamAccessLogsMessage) -> Envelope {
    let identity = message.identifier.map(to_stream_identity);
    let payload = match message.log_entries {
        Some(LogEntries::HttpLogs(entries)) => EnvelopePayload::Batch(RecordBatch::Http(
            entries.log_entry.into_iter().map(to_http_record).collect(),
        )),
        Some(LogEntries::TcpLogs(entries)) => EnvelopePayload::Batch(RecordBatch::Tcp(
            entries.log_entry.into_iter().map(to_tcp_record).collect(),
        )),
        None => EnvelopePayload::Unrecognized("no log entries".to_string()),
    };
    Envelope { identity, payload }
}

fn to_stream_identity(identifier: Identifier) -> StreamIdentity {
    StreamIdentity {
        node_id: identifier.node.map(|node| node.id).unwrap_or_default(),
        log_name: identifier.log_name,
    }
}

fn to_http_record(entry: HttpAccessLogEntry) -> HttpAccessRecord {
    let request = entry.request.unwrap_or_default();
    let response = entry.response.unwrap_or_default();
    let common = entry.common_properties;

    HttpAccessRecord {
        method: request_method_name(request.request_method),
        path: non_empty(request.path),
        authority: non_empty(request.authority),
        user_agent: non_empty(request.user_agent),
        response_code: response.response_code.map(|v| v.value),
        request_body_bytes: request.request_body_bytes,
        response_body_bytes: response.response_body_bytes,
        downstream_remote_address: common
            .as_ref()
            .and_then(|c| format_address(c.downstream_remote_address.as_ref())),
        upstream_cluster: common
            .as_ref()
            .and_then(|c| non_empty(c.upstream_cluster.clone())),
        start_time: start_time(common.as_ref()),
    }
}

fn to_tcp_record(entry: TcpAccessLogEntry) -> TcpAccessRecord {
    let connection = entry.connection_properties.unwrap_or_default();
    let common = entry.common_properties;

    TcpAccessRecord {
        downstream_remote_address: common
            .as_ref()
            .and_then(|c| format_address(c.downstream_remote_address.as_ref())),
        upstream_cluster: common
            .as_ref()
            .and_then(|c| non_empty(c.upstream_cluster.clone())),
        received_bytes: connection.received_bytes,
        sent_bytes: connection.sent_bytes,
        start_time: start_time(common.as_ref()),
    }
}

fn request_method_name(raw: i32) -> Option<String> {
    match RequestMethod::try_from(raw) {
        Ok(RequestMethod::MethodUnspecified) | Err(_) => None,
        Ok(method) => Some(method.as_str_name().to_string()),
    }
}

fn start_time(common: Option<&AccessLogCommon>) -> Option<DateTime<Utc>> {
    common?
        .start_time
        .as_ref()
        .and_then(|ts| DateTime::from_timestamp(ts.seconds, ts.nanos.try_into().ok()?))
}

fn format_address(address: Option<&Address>) -> Option<String> {
    match address?.address.as_ref()? {
        address::Address::SocketAddress(socket) => match socket.port_specifier.as_ref() {
            Some(PortSpecifier::PortValue(port)) => Some(format!("{}:{}", socket.address, port)),
            Some(PortSpecifier::NamedPort(name)) => Some(format!("{}:{}", socket.address, name)),
            None => Some(socket.address.clone()),
        },
        address::Address::Pipe(pipe) => Some(pipe.path.clone()),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Flatten one OTLP export request into envelopes, one per scope group,
/// in request order.
pub fn to_export_batch(request: ExportLogsServiceRequest) -> ExportBatch {
    let mut groups = Vec::new();
    for resource in request.resource_logs {
        for scope in resource.scope_logs {
            groups.push(to_scope_envelope(scope));
        }
    }
    ExportBatch { groups }
}

fn to_scope_envelope(scope_logs: ScopeLogs) -> Envelope {
    let scope = scope_logs
        .scope
        .as_ref()
        .and_then(|s| non_empty(s.name.clone()));
    let schema_url = non_empty(scope_logs.schema_url);

    let records = scope_logs
        .log_records
        .into_iter()
        .map(|record| to_app_log_record(record, scope.clone(), schema_url.clone()))
        .collect();

    Envelope::from_batch(RecordBatch::AppLog(records))
}

fn to_app_log_record(
    record: LogRecord,
    scope: Option<String>,
    schema_url: Option<String>,
) -> AppLogRecord {
    let severity = non_empty(record.severity_text)
        .or_else(|| severity_number_name(record.severity_number));

    AppLogRecord {
        scope,
        schema_url,
        severity,
        body: record.body.and_then(render_any_value),
        attribute_count: record.attributes.len(),
        observed_at: nanos_to_datetime(record.observed_time_unix_nano)
            .or_else(|| nanos_to_datetime(record.time_unix_nano)),
    }
}

fn severity_number_name(raw: i32) -> Option<String> {
    match SeverityNumber::try_from(raw) {
        Ok(SeverityNumber::Unspecified) | Err(_) => None,
        Ok(severity) => Some(severity.as_str_name().to_string()),
    }
}

fn nanos_to_datetime(nanos: u64) -> Option<DateTime<Utc>> {
    if nanos == 0 {
        return None;
    }
    let seconds = (nanos / 1_000_000_000) as i64;
    let subsec = (nanos % 1_000_000_000) as u32;
    DateTime::from_timestamp(seconds, subsec)
}

fn render_any_value(value: AnyValue) -> Option<String> {
    match value.value? {
        any_value::Value::StringValue(text) => Some(text),
        any_value::Value::BoolValue(flag) => Some(flag.to_string()),
        any_value::Value::IntValue(number) => Some(number.to_string()),
        any_value::Value::DoubleValue(number) => Some(number.to_string()),
        any_value::Value::BytesValue(bytes) => Some(format!("{} bytes", bytes.len())),
        any_value::Value::ArrayValue(array) => Some(format!("[{} values]", array.values.len())),
        any_value::Value::KvlistValue(entries) => {
            Some(format!("{{{} entries}}", entries.values.len()))
        }
    }
}
