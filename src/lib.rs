//! Single-shot network requests over an event-driven transport.
//!
//! A [`Request`] owns one [`Transport`] for exactly one attempt. The
//! transport reports completion through discrete `load` / `error` /
//! `timeout` events from a context the caller does not control; `send`
//! bridges those into a single awaited result, racing them against a
//! caller-supplied deadline and cancellation token. Only network-layer
//! failures are errors — HTTP 4xx/5xx surface through the status accessors
//! on an otherwise successful send.
//!
//! ```no_run
//! use onereq::{Request, RequestContext, ResponseFormat};
//!
//! # async fn demo() -> Result<(), onereq::SendError> {
//! let mut req = Request::new("GET", "https://example.com/endpoint");
//! req.override_response_format(ResponseFormat::Text);
//! req.send(None, &RequestContext::new()).await?;
//! if req.is_status_2xx() {
//!     println!("{:?}", req.body());
//! }
//! # Ok(()) }
//! ```
//!
//! For a request that should just return unprocessed bytes, use [`fetch`].

mod completion;

pub mod context;
pub mod errors;
pub mod params;
pub mod request;
pub mod response;
pub mod status;
pub mod transport;

pub use context::RequestContext;
pub use errors::SendError;
pub use params::Params;
pub use request::{fetch, Request, RequestState};
pub use response::{ResponseBody, ResponseSnapshot};
pub use transport::http::HttpTransport;
pub use transport::{ResponseFormat, TerminalEvent, Transport};
