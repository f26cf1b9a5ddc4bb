use crate::record::RecordBatch;

/// Identity an edge proxy attaches to the first message of a stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamIdentity {
    pub node_id: String,
    pub log_name: String,
}

/// Payload of one inbound envelope.
///
/// Exactly one of: a batch of a recognized kind, or an explicitly
/// unrecognized payload. An envelope is never silently dropped; the
/// unrecognized label names what the transport actually saw so the
/// diagnostic is useful.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopePayload {
    Batch(RecordBatch),
    Unrecognized(String),
}

/// One unit of input, received on a stream or carried in an export group.
/// Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub identity: Option<StreamIdentity>,
    pub payload: EnvelopePayload,
}

impl Envelope {
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            identity: None,
            payload: EnvelopePayload::Batch(batch),
        }
    }

    pub fn unrecognized(label: impl Into<String>) -> Self {
        Self {
            identity: None,
            payload: EnvelopePayload::Unrecognized(label.into()),
        }
    }

    /// The record batch, when the payload carries one.
    pub fn batch(&self) -> Option<&RecordBatch> {
        match &self.payload {
            EnvelopePayload::Batch(batch) => Some(batch),
            EnvelopePayload::Unrecognized(_) => None,
        }
    }

    /// Short label for diagnostics: the kind name, or what was seen.
    pub fn payload_label(&self) -> &str {
        match &self.payload {
            EnvelopePayload::Batch(batch) => batch.kind().as_str(),
            EnvelopePayload::Unrecognized(label) => label.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordBatch, TcpAccessRecord};

    #[test]
    fn test_batch_accessor() {
        let envelope = Envelope::from_batch(RecordBatch::Tcp(vec![TcpAccessRecord::default()]));
        assert_eq!(envelope.batch().map(RecordBatch::len), Some(1));
        assert_eq!(envelope.payload_label(), "tcp");

        let envelope = Envelope::unrecognized("metrics");
        assert!(envelope.batch().is_none());
        assert_eq!(envelope.payload_label(), "metrics");
    }
}
