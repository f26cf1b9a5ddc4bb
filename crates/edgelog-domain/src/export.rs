use std::sync::Arc;

use tracing::{debug, warn};

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::envelope::Envelope;
use crate::record::RecordBatch;

/// One export call's worth of record groups, flattened into envelopes in
/// request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBatch {
    pub groups: Vec<Envelope>,
}

/// Per-call accounting returned to the transport layer. Rejections are
/// reported to the producer; they never abort the call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub accepted_records: u64,
    pub rejected_records: u64,
    pub failures: Vec<String>,
}

impl ExportSummary {
    pub fn has_rejections(&self) -> bool {
        self.rejected_records > 0
    }
}

/// Stateless unary export path. Shares the dispatcher with the stream
/// sessions so both entry points route records identically.
pub struct LogExportService {
    dispatcher: Arc<Dispatcher>,
}

impl LogExportService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Dispatch every group of one export call, in order.
    ///
    /// A failing group marks its records rejected and is diagnosed;
    /// sibling groups still process, since the producer expects an
    /// acknowledgment per call rather than per group.
    pub fn export(&self, batch: ExportBatch) -> ExportSummary {
        debug!(groups = batch.groups.len(), "processing export request");

        let mut summary = ExportSummary::default();
        for (index, envelope) in batch.groups.iter().enumerate() {
            let group_records = envelope.batch().map_or(0, RecordBatch::len) as u64;
            match self.dispatcher.dispatch(envelope) {
                Ok(DispatchOutcome::Dispatched { records, .. }) => {
                    summary.accepted_records += records as u64;
                }
                // diagnosed by the dispatcher; the records still count as
                // rejected toward the producer
                Ok(DispatchOutcome::Unrecognized) | Ok(DispatchOutcome::Unhandled { .. }) => {
                    summary.rejected_records += group_records;
                }
                Err(err) => {
                    warn!(
                        group = index,
                        error = %err,
                        "export group failed, continuing with remaining groups"
                    );
                    summary.rejected_records += group_records;
                    summary.failures.push(format!("group {index}: {err}"));
                }
            }
        }

        debug!(
            accepted = summary.accepted_records,
            rejected = summary.rejected_records,
            "export request processed"
        );
        summary
    }
}
