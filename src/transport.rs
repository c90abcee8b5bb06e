//! The transport seam.
//!
//! A [`Transport`] performs the actual network call (sockets, TLS, DNS,
//! redirects — none of that lives in this crate) and reports completion
//! through discrete terminal events delivered from an execution context the
//! caller does not control. [`Request`](crate::Request) consumes this
//! contract and turns it into a single awaited result.

use std::sync::Arc;
use std::time::Duration;

use crate::response::ResponseSnapshot;

pub mod http;

/// Exactly one of these is delivered per send, unless an [`Transport::abort`]
/// suppressed it.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    /// The request completed and the response snapshot is readable. HTTP
    /// 4xx/5xx still arrive here; status interpretation is the caller's.
    Load(ResponseSnapshot),
    /// Network-layer failure. The transport provides no further detail.
    Error,
    /// The timeout configured via [`Transport::set_timeout`] elapsed.
    Timeout,
}

/// Where a transport delivers its terminal event. Cloneable and callable
/// from any thread; delivering into an already-resolved request is a no-op.
pub type EventSink = Arc<dyn Fn(TerminalEvent) + Send + Sync>;

/// How the response body should be materialized in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Raw bytes, unmodified.
    #[default]
    Bytes,
    /// UTF-8 text (lossy when the body is not valid UTF-8).
    Text,
    /// The raw markup of a document response, as text.
    Document,
    /// Body parsed as JSON. A body that fails to parse yields `null`.
    Json,
    /// An opaque binary blob.
    Blob,
}

/// A common "Content-Type" used by forms.
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
/// A common "Content-Type" used when posting JSON.
pub const APPLICATION_JSON: &str = "application/json";
/// A common "Content-Type".
pub const TEXT_PLAIN: &str = "text/plain";

/// A common "Content-Type" when transferring files in a POST request.
pub fn multipart_form_data(boundary: &str) -> String {
    format!("multipart/form-data;boundary=\"{boundary}\"")
}

/// One request's worth of asynchronous I/O.
///
/// Contract:
/// - [`send`](Transport::send) must eventually deliver exactly one
///   [`TerminalEvent`] through the sink it is given, from whatever thread or
///   task the transport owns, unless a preceding or concurrent
///   [`abort`](Transport::abort) suppressed it.
/// - [`abort`](Transport::abort) is best-effort and idempotent; calling it
///   after completion is safe. An event that still fires after an abort is
///   discarded by the receiving side, so transports need not guarantee
///   suppression.
/// - The configuration methods have no completion semantics and are only
///   meaningful before [`send`](Transport::send).
///
/// A transport instance backs exactly one request attempt and is exclusively
/// owned by it.
pub trait Transport: Send + 'static {
    /// Prepares the request line. No I/O is observable yet.
    fn open(&mut self, method: &str, url: &str);

    /// Sets one request header; last write wins per name.
    fn set_header(&mut self, name: &str, value: &str);

    /// Arms the transport's own wall-clock timeout for the whole exchange.
    /// A zero duration means "already expired": the transport should fire
    /// `timeout` promptly.
    fn set_timeout(&mut self, timeout: Duration);

    /// Selects how the response body is materialized.
    fn override_response_format(&mut self, format: ResponseFormat);

    /// Issues the request. `payload` is an opaque byte sequence; the
    /// transport must not invent a content-type for it.
    fn send(&mut self, payload: Option<Vec<u8>>, events: EventSink);

    /// Best-effort cancellation of the in-flight exchange.
    fn abort(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_content_types() {
        assert_eq!(APPLICATION_FORM, "application/x-www-form-urlencoded");
        assert_eq!(APPLICATION_JSON, "application/json");
        assert_eq!(TEXT_PLAIN, "text/plain");
        assert_eq!(
            multipart_form_data("xyz"),
            "multipart/form-data;boundary=\"xyz\""
        );
    }
}
