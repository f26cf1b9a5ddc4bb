use std::fmt;
use std::sync::Arc;

use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::envelope::Envelope;
use crate::error::{ReceiveError, SessionError};

/// Lifecycle states of one stream session.
///
/// `Open → Receiving → {Closing, Cancelled, Failed} → Closed`; every
/// terminal path converges to `Closed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Receiving,
    Closing,
    Cancelled,
    Failed,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Receiving => "receiving",
            SessionState::Closing => "closing",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended cleanly. Cancellation is a success path distinct
/// from the peer closing the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    StreamClosed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: SessionEnd,
    pub envelopes: u64,
    pub records: u64,
}

/// Owns the receive loop of one client stream.
///
/// Stateless between invocations: the only state a session has lives in
/// `run`'s locals, so one `StreamSession` is safely shared by every
/// concurrent stream of a server.
pub struct StreamSession {
    dispatcher: Arc<Dispatcher>,
}

impl StreamSession {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Drain one inbound stream until end-of-stream, transport error, or
    /// cancellation.
    ///
    /// The loop selects between the cancellation signal and the next
    /// receive, biased toward cancellation: there is no window in which a
    /// fired token leaves the session blocked on a receive, and no new
    /// dispatch starts once the token has fired. A handler already
    /// invoked always runs to completion before the signal is observed.
    pub async fn run<S>(
        &self,
        mut inbound: S,
        ctx: CancellationToken,
    ) -> Result<SessionSummary, SessionError>
    where
        S: Stream<Item = Result<Envelope, ReceiveError>> + Unpin,
    {
        let mut envelopes = 0u64;
        let mut records = 0u64;

        Self::transition(SessionState::Open, SessionState::Receiving);

        let outcome: Result<SessionEnd, SessionError> = loop {
            tokio::select! {
                biased;

                _ = ctx.cancelled() => {
                    Self::transition(SessionState::Receiving, SessionState::Cancelled);
                    break Ok(SessionEnd::Cancelled);
                }

                received = inbound.next() => match received {
                    None => {
                        Self::transition(SessionState::Receiving, SessionState::Closing);
                        break Ok(SessionEnd::StreamClosed);
                    }
                    Some(Err(err)) => {
                        error!(error = %err, "error receiving from stream");
                        Self::transition(SessionState::Receiving, SessionState::Failed);
                        break Err(SessionError::Receive(err));
                    }
                    Some(Ok(envelope)) => {
                        envelopes += 1;
                        // proxies identify themselves on the first message only
                        if let Some(identity) = &envelope.identity {
                            debug!(
                                node_id = %identity.node_id,
                                log_name = %identity.log_name,
                                "stream identity received"
                            );
                        }
                        match self.dispatcher.dispatch(&envelope) {
                            Ok(DispatchOutcome::Dispatched { kind, records: count }) => {
                                records += count as u64;
                                debug!(kind = %kind, count, "dispatched envelope");
                            }
                            // already diagnosed by the dispatcher; keep receiving
                            Ok(DispatchOutcome::Unrecognized)
                            | Ok(DispatchOutcome::Unhandled { .. }) => {}
                            Err(err) => {
                                error!(error = %err, "handler fault, failing session");
                                Self::transition(SessionState::Receiving, SessionState::Failed);
                                break Err(SessionError::Dispatch(err));
                            }
                        }
                    }
                },
            }
        };

        // Single convergence point: the stream and counters drop here no
        // matter which terminal state was reached.
        let terminal = match &outcome {
            Ok(SessionEnd::StreamClosed) => SessionState::Closing,
            Ok(SessionEnd::Cancelled) => SessionState::Cancelled,
            Err(_) => SessionState::Failed,
        };
        Self::transition(terminal, SessionState::Closed);

        let end = outcome?;
        info!(envelopes, records, end = ?end, "session closed");
        Ok(SessionSummary {
            end,
            envelopes,
            records,
        })
    }

    fn transition(from: SessionState, to: SessionState) {
        debug!(from = %from, to = %to, "session state transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handler::{KindHandler, MockKindHandler};
    use crate::record::{HttpAccessRecord, RecordBatch, RecordKind, TcpAccessRecord};
    use std::sync::Mutex;

    /// Handler that appends one entry per record, tagged with its kind.
    struct RecordingHandler {
        kind: RecordKind,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl KindHandler for RecordingHandler {
        fn kind(&self) -> RecordKind {
            self.kind
        }

        fn handle(&self, batch: &RecordBatch) -> Result<(), HandlerError> {
            let mut events = self.events.lock().unwrap();
            for index in 0..batch.len() {
                events.push(format!("{}:{}", self.kind, index));
            }
            Ok(())
        }
    }

    fn recording_dispatcher(events: &Arc<Mutex<Vec<String>>>) -> Arc<Dispatcher> {
        Arc::new(
            Dispatcher::new([
                Arc::new(RecordingHandler {
                    kind: RecordKind::Http,
                    events: events.clone(),
                }) as Arc<dyn KindHandler>,
                Arc::new(RecordingHandler {
                    kind: RecordKind::Tcp,
                    events: events.clone(),
                }) as Arc<dyn KindHandler>,
            ])
            .unwrap(),
        )
    }

    fn http_envelope(records: usize) -> Envelope {
        Envelope::from_batch(RecordBatch::Http(vec![
            HttpAccessRecord::default();
            records
        ]))
    }

    fn tcp_envelope(records: usize) -> Envelope {
        Envelope::from_batch(RecordBatch::Tcp(vec![TcpAccessRecord::default(); records]))
    }

    #[tokio::test]
    async fn test_session_processes_stream_in_order_until_close() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = StreamSession::new(recording_dispatcher(&events));

        // 3 http records, then 2 tcp records, then end-of-stream
        let inbound = tokio_stream::iter(vec![Ok(http_envelope(3)), Ok(tcp_envelope(2))]);
        let summary = session.run(inbound, CancellationToken::new()).await.unwrap();

        assert_eq!(summary.end, SessionEnd::StreamClosed);
        assert_eq!(summary.envelopes, 2);
        assert_eq!(summary.records, 5);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["http:0", "http:1", "http:2", "tcp:0", "tcp:1"]
        );
    }

    #[tokio::test]
    async fn test_session_preserves_order_across_batches_of_one_kind() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = StreamSession::new(recording_dispatcher(&events));

        let inbound = tokio_stream::iter(vec![Ok(http_envelope(2)), Ok(http_envelope(2))]);
        let summary = session.run(inbound, CancellationToken::new()).await.unwrap();

        // 4 records total, no duplication, batch order preserved
        assert_eq!(summary.records, 4);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["http:0", "http:1", "http:0", "http:1"]
        );
    }

    #[tokio::test]
    async fn test_session_skips_unrecognized_and_continues() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = StreamSession::new(recording_dispatcher(&events));

        let inbound = tokio_stream::iter(vec![
            Ok(Envelope::unrecognized("no log entries")),
            Ok(http_envelope(1)),
        ]);
        let summary = session.run(inbound, CancellationToken::new()).await.unwrap();

        assert_eq!(summary.end, SessionEnd::StreamClosed);
        assert_eq!(summary.envelopes, 2);
        assert_eq!(summary.records, 1);
        assert_eq!(*events.lock().unwrap(), vec!["http:0"]);
    }

    #[tokio::test]
    async fn test_session_cancellation_is_clean_and_dispatches_nothing() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = StreamSession::new(recording_dispatcher(&events));

        let ctx = CancellationToken::new();
        ctx.cancel();

        // The stream never yields; a missed cancellation would hang here
        let inbound = tokio_stream::pending::<Result<Envelope, ReceiveError>>();
        let summary = session.run(inbound, ctx).await.unwrap();

        assert_eq!(summary.end, SessionEnd::Cancelled);
        assert_eq!(summary.envelopes, 0);
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_cancellation_wins_over_ready_input() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = StreamSession::new(recording_dispatcher(&events));

        let ctx = CancellationToken::new();
        ctx.cancel();

        // Input is immediately ready, but the fired token must still stop
        // the session before any new dispatch starts
        let inbound = tokio_stream::iter(vec![Ok(http_envelope(3))]);
        let summary = session.run(inbound, ctx).await.unwrap();

        assert_eq!(summary.end, SessionEnd::Cancelled);
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_receive_error_fails_session() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = StreamSession::new(recording_dispatcher(&events));

        let inbound = tokio_stream::iter(vec![
            Ok(http_envelope(1)),
            Err(ReceiveError::new("connection reset")),
            Ok(http_envelope(1)),
        ]);
        let err = session
            .run(inbound, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Receive(_)));
        // the first envelope was already dispatched; nothing after the error
        assert_eq!(*events.lock().unwrap(), vec!["http:0"]);
    }

    #[tokio::test]
    async fn test_session_handler_fault_fails_session() {
        let mut handler = MockKindHandler::new();
        handler.expect_kind().return_const(RecordKind::Http);
        handler
            .expect_handle()
            .returning(|_| Err(HandlerError::new("sink unavailable")));

        let dispatcher =
            Arc::new(Dispatcher::new([Arc::new(handler) as Arc<dyn KindHandler>]).unwrap());
        let session = StreamSession::new(dispatcher);

        let inbound = tokio_stream::iter(vec![Ok(http_envelope(1))]);
        let err = session
            .run(inbound, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Dispatch(_)));
    }
}
