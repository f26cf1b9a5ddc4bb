pub mod classify;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod export;
pub mod handler;
pub mod record;
pub mod session;

pub use classify::{classify, Classification};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use envelope::{Envelope, EnvelopePayload, StreamIdentity};
pub use error::{
    DispatchError, DomainError, DomainResult, HandlerError, ReceiveError, SessionError,
};
pub use export::{ExportBatch, ExportSummary, LogExportService};
pub use handler::{AppLogEmitHandler, HttpEmitHandler, KindHandler, TcpEmitHandler};
pub use record::{AppLogRecord, HttpAccessRecord, RecordBatch, RecordKind, TcpAccessRecord};
pub use session::{SessionEnd, SessionState, SessionSummary, StreamSession};

#[cfg(any(test, feature = "testing"))]
pub use handler::MockKindHandler;
