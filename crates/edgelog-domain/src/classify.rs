use crate::envelope::{Envelope, EnvelopePayload};
use crate::record::RecordKind;

/// Outcome of classifying one envelope. Unrecognized is a normal result,
/// not a failure; the caller decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Recognized(RecordKind),
    Unrecognized,
}

/// Determine the payload kind of one envelope.
///
/// Pure and total: every envelope value maps to exactly one outcome, with
/// no side effects and no error return.
pub fn classify(envelope: &Envelope) -> Classification {
    match &envelope.payload {
        EnvelopePayload::Batch(batch) => Classification::Recognized(batch.kind()),
        EnvelopePayload::Unrecognized(_) => Classification::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AppLogRecord, HttpAccessRecord, RecordBatch, TcpAccessRecord};

    #[test]
    fn test_classify_recognizes_each_kind() {
        let http = Envelope::from_batch(RecordBatch::Http(vec![HttpAccessRecord::default()]));
        assert_eq!(
            classify(&http),
            Classification::Recognized(RecordKind::Http)
        );

        let tcp = Envelope::from_batch(RecordBatch::Tcp(vec![TcpAccessRecord::default()]));
        assert_eq!(classify(&tcp), Classification::Recognized(RecordKind::Tcp));

        let app_log = Envelope::from_batch(RecordBatch::AppLog(vec![AppLogRecord::default()]));
        assert_eq!(
            classify(&app_log),
            Classification::Recognized(RecordKind::AppLog)
        );
    }

    #[test]
    fn test_classify_reports_unrecognized() {
        let envelope = Envelope::unrecognized("no log entries");
        assert_eq!(classify(&envelope), Classification::Unrecognized);
    }

    #[test]
    fn test_classify_is_stable_for_empty_batches() {
        // An empty batch still has exactly one kind
        let envelope = Envelope::from_batch(RecordBatch::Http(vec![]));
        assert_eq!(
            classify(&envelope),
            Classification::Recognized(RecordKind::Http)
        );
    }
}
