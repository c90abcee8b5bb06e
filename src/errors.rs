/// Terminal errors returned by [`Request::send`](crate::Request::send).
///
/// Only network-layer outcomes appear here. HTTP status codes are never
/// mapped to errors; a 4xx or 5xx response is a successful send and must be
/// inspected through the status accessors instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The transport reported a failure. The transport exposes no further
    /// detail (DNS, refused connection, reset, ... all look the same), so
    /// none is synthesized here.
    #[error("send failed")]
    NetworkFailure,

    /// The wall-clock deadline elapsed before a response arrived, whether
    /// configured directly on the transport or derived from the caller's
    /// deadline.
    #[error("deadline exceeded")]
    Timeout,

    /// The caller's cancellation token fired before completion. The
    /// transport has been told to abort.
    #[error("request cancelled")]
    Cancelled,
}
