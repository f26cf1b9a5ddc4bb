use thiserror::Error;

use crate::record::RecordKind;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Duplicate handler registered for record kind: {0}")]
    DuplicateHandler(RecordKind),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure reported by a kind handler for one batch.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Mid-stream transport failure surfaced by the receive side of a session.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ReceiveError {
    pub message: String,
}

impl ReceiveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Handler for {kind} records failed: {source}")]
    Handler {
        kind: RecordKind,
        #[source]
        source: HandlerError,
    },

    #[error("Handler for {kind} records panicked: {panic}")]
    HandlerPanic { kind: RecordKind, panic: String },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Stream receive failed: {0}")]
    Receive(#[from] ReceiveError),

    #[error("Record dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}
