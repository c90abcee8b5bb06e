//! The request controller.
//!
//! [`Request`] owns one [`Transport`] for exactly one attempt and turns the
//! transport's callback-style terminal events into a single awaited result.
//! The rendezvous between the transport's delivery context and the waiting
//! caller goes through a first-write-wins [`CompletionSlot`]: the transport
//! writes its terminal event into the slot, a caller-supplied cancellation
//! token races against it, and whichever source reaches the slot's consumer
//! first decides the outcome. The loser is disregarded without blocking or
//! queueing anything.

use std::sync::Arc;
use std::time::Instant;

use crate::completion::CompletionSlot;
use crate::context::RequestContext;
use crate::errors::SendError;
use crate::response::{ResponseBody, ResponseSnapshot};
use crate::status;
use crate::transport::http::HttpTransport;
use crate::transport::{EventSink, ResponseFormat, TerminalEvent, Transport};

/// Lifecycle of one request attempt. `Idle → Pending` happens at most once;
/// the `Completed` states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// Constructed and opened; send not yet issued.
    #[default]
    Idle,
    /// Send issued; waiting for exactly one terminal event.
    Pending,
    /// A `load` event arrived first; the response snapshot is readable.
    Succeeded,
    /// The transport reported a network-layer failure.
    Failed,
    /// The wall-clock timeout elapsed first.
    TimedOut,
    /// The caller's cancellation token fired first.
    Cancelled,
}

/// A single-use network request bound to one exclusively owned transport.
///
/// Construct with [`Request::new`] (bundled HTTP transport) or
/// [`Request::with_transport`], optionally configure headers and the
/// response format, then call [`send`](Request::send) exactly once.
pub struct Request<T: Transport> {
    transport: T,
    method: String,
    url: String,
    state: RequestState,
    response: Option<ResponseSnapshot>,
}

impl Request<HttpTransport> {
    /// Creates a request over the bundled reqwest-backed transport. Must be
    /// called from within a tokio runtime context, which the transport uses
    /// to run the exchange.
    pub fn new(method: &str, url: &str) -> Self {
        Self::with_transport(method, url, HttpTransport::new())
    }
}

impl<T: Transport> Request<T> {
    /// Creates a request over a caller-supplied transport and opens it.
    pub fn with_transport(method: &str, url: &str, mut transport: T) -> Self {
        transport.open(method, url);
        Self {
            transport,
            method: method.to_string(),
            url: url.to_string(),
            state: RequestState::Idle,
            response: None,
        }
    }

    /// Sets one request header; last write wins per name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.transport.set_header(name, value);
    }

    /// Selects how the response body is materialized on success.
    pub fn override_response_format(&mut self, format: ResponseFormat) {
        self.transport.override_response_format(format);
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Issues the request and waits for its single terminal outcome.
    ///
    /// `payload` is treated as an opaque byte sequence; no content-type is
    /// negotiated on its behalf. The context's deadline, when present, is
    /// pushed down into the transport's own timeout mechanism before the
    /// send is issued — this method arms no timer of its own, so an absent
    /// deadline never produces a timeout. If the cancellation token fires
    /// before any transport event, the transport is told to abort and
    /// [`SendError::Cancelled`] is returned.
    ///
    /// Returns exactly once: `Ok(())` with the response snapshot populated,
    /// or exactly one [`SendError`]. HTTP 4xx/5xx are not errors here.
    ///
    /// # Panics
    ///
    /// Panics when called a second time on the same instance, regardless of
    /// the first call's outcome. A `Request` backs exactly one attempt.
    pub async fn send(
        &mut self,
        payload: Option<Vec<u8>>,
        ctx: &RequestContext,
    ) -> Result<(), SendError> {
        if self.state != RequestState::Idle {
            panic!("a Request backs exactly one send; construct a new Request for another attempt");
        }

        if let Some(deadline) = ctx.deadline {
            // Pushed into the transport so that wall-clock expiry has a
            // single source. An already-passed deadline becomes a zero
            // timeout, which the transport fires promptly.
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.transport.set_timeout(remaining);
        }

        let (slot, completed) = CompletionSlot::new();
        let sink: EventSink = {
            let slot = Arc::clone(&slot);
            Arc::new(move |event| {
                slot.complete(event);
            })
        };

        self.state = RequestState::Pending;
        log::debug!("send {} {}", self.method, self.url);
        self.transport.send(payload, sink);

        let cancelled = async {
            match &ctx.cancel {
                Some(token) => token.cancelled().await,
                None => futures::future::pending().await,
            }
        };

        // Unbiased select: a simultaneously-arriving terminal event and
        // cancellation are resolved by delivery order, not by kind.
        let outcome = tokio::select! {
            event = completed => classify(event.ok()),
            _ = cancelled => {
                log::debug!("cancelled, aborting {} {}", self.method, self.url);
                self.transport.abort();
                Err(SendError::Cancelled)
            }
        };

        match outcome {
            Ok(snapshot) => {
                log::debug!("load {} {} -> {}", self.method, self.url, snapshot.status);
                self.state = RequestState::Succeeded;
                self.response = Some(snapshot);
                Ok(())
            }
            Err(err) => {
                self.state = match err {
                    SendError::NetworkFailure => RequestState::Failed,
                    SendError::Timeout => RequestState::TimedOut,
                    SendError::Cancelled => RequestState::Cancelled,
                };
                Err(err)
            }
        }
    }

    /// Blocking wrapper around [`send`](Request::send) for callers without
    /// an async context of their own. The transport must deliver its events
    /// from an execution context it owns (every transport in this crate
    /// does); for [`HttpTransport`] the calling thread must still be inside
    /// a tokio runtime context.
    pub fn send_blocking(
        &mut self,
        payload: Option<Vec<u8>>,
        ctx: &RequestContext,
    ) -> Result<(), SendError> {
        pollster::block_on(self.send(payload, ctx))
    }

    /// The response snapshot, populated once the state is
    /// [`RequestState::Succeeded`].
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        self.response.as_ref()
    }

    /// Numeric status code; `0` until a load has completed.
    pub fn status(&self) -> u16 {
        self.response.as_ref().map(|r| r.status).unwrap_or(0)
    }

    /// Reason phrase; empty until a load has completed.
    pub fn status_text(&self) -> &str {
        self.response.as_ref().map(|r| r.status_text.as_str()).unwrap_or("")
    }

    /// The value of one response header, or `""` when absent.
    pub fn response_header(&self, name: &str) -> String {
        self.response.as_ref().map(|r| r.header(name)).unwrap_or_default()
    }

    /// All response headers as a newline-delimited `Name: Value` blob.
    pub fn response_headers(&self) -> String {
        self.response.as_ref().map(|r| r.headers_blob()).unwrap_or_default()
    }

    /// The response body in the selected format, once loaded.
    pub fn body(&self) -> Option<&ResponseBody> {
        self.response.as_ref().map(|r| &r.body)
    }

    /// True if the request completed with a 2xx status. Before completion
    /// the status is `0`, which is in no class.
    pub fn is_status_2xx(&self) -> bool {
        status::is_2xx(self.status())
    }

    /// True if the request completed with a 4xx status.
    pub fn is_status_4xx(&self) -> bool {
        status::is_4xx(self.status())
    }

    /// True if the request completed with a 5xx status.
    pub fn is_status_5xx(&self) -> bool {
        status::is_5xx(self.status())
    }
}

/// Maps the transport's terminal signal to the outcome. `None` means the
/// transport dropped its sink without delivering any event, a contract
/// breach reported as a plain network failure.
fn classify(event: Option<TerminalEvent>) -> Result<ResponseSnapshot, SendError> {
    match event {
        Some(TerminalEvent::Load(snapshot)) => Ok(snapshot),
        Some(TerminalEvent::Error) => Err(SendError::NetworkFailure),
        Some(TerminalEvent::Timeout) => Err(SendError::Timeout),
        None => Err(SendError::NetworkFailure),
    }
}

/// Constructs a request over the bundled HTTP transport, sends it, and
/// returns the raw response bytes. The easiest way to do a request that
/// should just return unprocessed data; build a [`Request`] yourself for
/// access to status codes, headers, and other response formats.
pub async fn fetch(
    method: &str,
    url: &str,
    payload: Option<Vec<u8>>,
    ctx: &RequestContext,
) -> Result<Vec<u8>, SendError> {
    let mut request = Request::new(method, url);
    request.override_response_format(ResponseFormat::Bytes);
    request.send(payload, ctx).await?;
    Ok(request.body().map(|b| b.as_bytes()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// What the transport pretends the network did.
    #[derive(Clone, Copy)]
    enum Script {
        LoadAfter(Duration),
        ErrorAfter(Duration),
        TimeoutAfter(Duration),
        /// Never delivers anything.
        Silent,
    }

    /// In-memory transport that replays a script from its own thread, the
    /// way a real transport delivers events from a context the caller does
    /// not control.
    struct ScriptedTransport {
        script: Script,
        aborts: Arc<AtomicU32>,
        timeouts: Arc<Mutex<Vec<Duration>>>,
    }

    impl ScriptedTransport {
        fn new(script: Script) -> Self {
            Self {
                script,
                aborts: Arc::new(AtomicU32::new(0)),
                timeouts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    fn snapshot_ok() -> ResponseSnapshot {
        ResponseSnapshot {
            status: 200,
            status_text: "OK".to_string(),
            headers: HeaderMap::new(),
            body: ResponseBody::Bytes(b"payload".to_vec()),
        }
    }

    impl Transport for ScriptedTransport {
        fn open(&mut self, _method: &str, _url: &str) {}
        fn set_header(&mut self, _name: &str, _value: &str) {}

        fn set_timeout(&mut self, timeout: Duration) {
            self.timeouts.lock().unwrap().push(timeout);
        }

        fn override_response_format(&mut self, _format: ResponseFormat) {}

        fn send(&mut self, _payload: Option<Vec<u8>>, events: EventSink) {
            let script = self.script;
            std::thread::spawn(move || match script {
                Script::LoadAfter(delay) => {
                    std::thread::sleep(delay);
                    events(TerminalEvent::Load(snapshot_ok()));
                }
                Script::ErrorAfter(delay) => {
                    std::thread::sleep(delay);
                    events(TerminalEvent::Error);
                }
                Script::TimeoutAfter(delay) => {
                    std::thread::sleep(delay);
                    events(TerminalEvent::Timeout);
                }
                Script::Silent => {}
            });
        }

        fn abort(&mut self) {
            self.aborts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request(script: Script) -> (Request<ScriptedTransport>, Arc<AtomicU32>, Arc<Mutex<Vec<Duration>>>) {
        let transport = ScriptedTransport::new(script);
        let aborts = Arc::clone(&transport.aborts);
        let timeouts = Arc::clone(&transport.timeouts);
        (Request::with_transport("GET", "http://test/endpoint", transport), aborts, timeouts)
    }

    #[tokio::test]
    async fn load_resolves_success_and_never_aborts() {
        let (mut req, aborts, _) = request(Script::LoadAfter(Duration::from_millis(5)));

        req.send(None, &RequestContext::new()).await.unwrap();

        assert_eq!(req.state(), RequestState::Succeeded);
        assert_eq!(req.status(), 200);
        assert_eq!(req.status_text(), "OK");
        assert!(req.is_status_2xx());
        assert_eq!(req.body(), Some(&ResponseBody::Bytes(b"payload".to_vec())));
        assert_eq!(aborts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn error_event_maps_to_network_failure() {
        let (mut req, _, _) = request(Script::ErrorAfter(Duration::from_millis(5)));

        let err = req.send(None, &RequestContext::new()).await.unwrap_err();

        assert_eq!(err, SendError::NetworkFailure);
        assert_eq!(req.state(), RequestState::Failed);
        assert_eq!(req.status(), 0);
        assert!(!req.is_status_2xx());
        assert!(!req.is_status_4xx());
        assert!(!req.is_status_5xx());
    }

    #[tokio::test]
    async fn timeout_event_maps_to_timeout() {
        let (mut req, _, _) = request(Script::TimeoutAfter(Duration::from_millis(5)));

        let err = req.send(None, &RequestContext::new()).await.unwrap_err();

        assert_eq!(err, SendError::Timeout);
        assert_eq!(req.state(), RequestState::TimedOut);
    }

    #[tokio::test]
    async fn cancellation_wins_over_silent_transport_and_aborts_it() {
        let (mut req, aborts, _) = request(Script::Silent);

        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancel(token);

        let err = req.send(None, &ctx).await.unwrap_err();

        assert_eq!(err, SendError::Cancelled);
        assert_eq!(req.state(), RequestState::Cancelled);
        assert!(aborts.load(Ordering::SeqCst) >= 1);
        assert!(req.response().is_none());
    }

    #[tokio::test]
    async fn late_load_after_cancellation_is_discarded() {
        let (mut req, _, _) = request(Script::LoadAfter(Duration::from_millis(50)));

        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancel(token);

        let err = req.send(None, &ctx).await.unwrap_err();
        assert_eq!(err, SendError::Cancelled);

        // Let the scripted load fire into the already-resolved slot. It
        // must neither block its thread nor alter the outcome.
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(req.state(), RequestState::Cancelled);
        assert!(req.response().is_none());
    }

    #[tokio::test]
    async fn deadline_is_pushed_into_the_transport() {
        let (mut req, _, timeouts) = request(Script::LoadAfter(Duration::from_millis(1)));

        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        req.send(None, &ctx).await.unwrap();

        let recorded = timeouts.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0] <= Duration::from_secs(5));
        assert!(recorded[0] > Duration::from_secs(4));
    }

    #[tokio::test]
    async fn no_deadline_means_no_transport_timeout_and_no_early_termination() {
        let (mut req, _, timeouts) = request(Script::Silent);

        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancel(token.clone());

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            token.cancel();
        });

        // Only the explicit cancellation ends the wait; no timeout was ever
        // configured on the transport.
        let err = req.send(None, &ctx).await.unwrap_err();
        canceller.join().unwrap();

        assert_eq!(err, SendError::Cancelled);
        assert!(timeouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "exactly one send")]
    async fn second_send_panics_even_after_success() {
        let (mut req, _, _) = request(Script::LoadAfter(Duration::from_millis(1)));

        req.send(None, &RequestContext::new()).await.unwrap();
        let _ = req.send(None, &RequestContext::new()).await;
    }

    #[tokio::test]
    #[should_panic(expected = "exactly one send")]
    async fn second_send_panics_after_cancellation_too() {
        let (mut req, _, _) = request(Script::Silent);

        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancel(token);
        let _ = req.send(None, &ctx).await;

        let _ = req.send(None, &RequestContext::new()).await;
    }

    #[test]
    fn classify_covers_the_whole_taxonomy() {
        assert!(classify(Some(TerminalEvent::Load(snapshot_ok()))).is_ok());
        assert_eq!(classify(Some(TerminalEvent::Error)), Err(SendError::NetworkFailure));
        assert_eq!(classify(Some(TerminalEvent::Timeout)), Err(SendError::Timeout));
        assert_eq!(classify(None), Err(SendError::NetworkFailure));
    }
}
