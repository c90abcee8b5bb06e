//! Caller-supplied deadline and cancellation for one send.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation context for a single
/// [`Request::send`](crate::Request::send).
///
/// Both pieces are optional. Without a deadline the request can only be
/// terminated by the transport or by cancellation; without a cancellation
/// token the caller has no way to end the wait early.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub(crate) deadline: Option<Instant>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an absolute deadline. The remaining wall-clock time is pushed
    /// into the transport's own timeout mechanism when the send is issued.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline sugar: `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attaches a cancellation token. Cancelling it while a send is pending
    /// aborts the transport and resolves the send with
    /// [`SendError::Cancelled`](crate::SendError::Cancelled).
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
