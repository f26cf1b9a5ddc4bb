use edgelog_domain::SessionError;
use tonic::Status;

/// Convert a session failure to the gRPC status returned to the sender.
///
/// Receive failures keep their transport flavor; handler faults are the
/// server's problem and map to internal.
pub fn session_error_to_status(error: SessionError) -> Status {
    match error {
        SessionError::Receive(err) => Status::aborted(format!("stream receive failed: {err}")),
        SessionError::Dispatch(err) => Status::internal(format!("record handling failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelog_domain::{DispatchError, HandlerError, ReceiveError, RecordKind};

    #[test]
    fn test_receive_error_maps_to_aborted() {
        let status =
            session_error_to_status(SessionError::Receive(ReceiveError::new("reset by peer")));
        assert_eq!(status.code(), tonic::Code::Aborted);
        assert!(status.message().contains("reset by peer"));
    }

    #[test]
    fn test_dispatch_error_maps_to_internal() {
        let status = session_error_to_status(SessionError::Dispatch(DispatchError::Handler {
            kind: RecordKind::Http,
            source: HandlerError::new("sink unavailable"),
        }));
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(status.message().contains("sink unavailable"));
    }
}
