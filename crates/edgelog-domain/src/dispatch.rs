use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::classify::{classify, Classification};
use crate::envelope::Envelope;
use crate::error::{DispatchError, DomainError};
use crate::handler::KindHandler;
use crate::record::RecordKind;

/// What happened to one envelope. Non-error outcomes are deliberately
/// observable so callers can count skipped envelopes instead of losing
/// them in a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The matching handler processed the batch.
    Dispatched { kind: RecordKind, records: usize },
    /// The kind is recognized but no handler is registered for it.
    Unhandled { kind: RecordKind },
    /// The payload kind is not recognized.
    Unrecognized,
}

/// The single classify-then-handle path shared by the stream and export
/// entry points.
pub struct Dispatcher {
    handlers: HashMap<RecordKind, Arc<dyn KindHandler>>,
}

impl Dispatcher {
    /// Build a dispatcher from a handler set. At most one handler per kind.
    pub fn new(
        handlers: impl IntoIterator<Item = Arc<dyn KindHandler>>,
    ) -> Result<Self, DomainError> {
        let mut registered: HashMap<RecordKind, Arc<dyn KindHandler>> = HashMap::new();
        for handler in handlers {
            let kind = handler.kind();
            if registered.insert(kind, handler).is_some() {
                return Err(DomainError::DuplicateHandler(kind));
            }
        }
        Ok(Self {
            handlers: registered,
        })
    }

    /// Route one envelope to its kind handler.
    ///
    /// Unrecognized and unhandled payloads are diagnosed and reported as
    /// outcomes, not errors; processing is expected to continue. Handler
    /// failures and panics come back as `DispatchError` — containing a
    /// panic here is what keeps one faulty handler from tearing down the
    /// whole process instead of just the current session.
    pub fn dispatch(&self, envelope: &Envelope) -> Result<DispatchOutcome, DispatchError> {
        let kind = match classify(envelope) {
            Classification::Recognized(kind) => kind,
            Classification::Unrecognized => {
                warn!(
                    payload = envelope.payload_label(),
                    "received unsupported payload kind, skipping envelope"
                );
                return Ok(DispatchOutcome::Unrecognized);
            }
        };

        let Some(batch) = envelope.batch() else {
            // classify() only recognizes envelopes that carry a batch
            return Ok(DispatchOutcome::Unrecognized);
        };

        let Some(handler) = self.handlers.get(&kind) else {
            warn!(kind = %kind, "no handler registered for payload kind, skipping envelope");
            return Ok(DispatchOutcome::Unhandled { kind });
        };

        let records = batch.len();
        match catch_unwind(AssertUnwindSafe(|| handler.handle(batch))) {
            Ok(Ok(())) => Ok(DispatchOutcome::Dispatched { kind, records }),
            Ok(Err(source)) => Err(DispatchError::Handler { kind, source }),
            Err(panic) => Err(DispatchError::HandlerPanic {
                kind,
                panic: panic_message(panic),
            }),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
