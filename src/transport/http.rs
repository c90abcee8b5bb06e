//! reqwest-backed [`Transport`] adapter.
//!
//! One instance backs one exchange. Configuration calls accumulate into
//! plain fields; `send` spawns the actual round-trip onto the ambient tokio
//! runtime and translates its result into exactly one terminal event.
//! `abort` cancels an internal token that suppresses the pending event —
//! best effort, since the event may already be in flight, in which case the
//! receiving side discards it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::response::{ResponseBody, ResponseSnapshot};
use crate::transport::{EventSink, ResponseFormat, TerminalEvent, Transport};

pub struct HttpTransport {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    format: ResponseFormat,
    abort: CancellationToken,
}

impl HttpTransport {
    /// Creates an unconfigured transport. Must be used from within a tokio
    /// runtime context, onto which [`send`](Transport::send) spawns the
    /// exchange.
    pub fn new() -> Self {
        Self {
            method: String::new(),
            url: String::new(),
            headers: Vec::new(),
            timeout: None,
            format: ResponseFormat::default(),
            abort: CancellationToken::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn open(&mut self, method: &str, url: &str) {
        self.method = method.to_string();
        self.url = url.to_string();
    }

    fn set_header(&mut self, name: &str, value: &str) {
        // Last write wins per name.
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(pair) => pair.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn override_response_format(&mut self, format: ResponseFormat) {
        self.format = format;
    }

    fn send(&mut self, payload: Option<Vec<u8>>, events: EventSink) {
        let method = self.method.clone();
        let url = self.url.clone();
        let headers = self.headers.clone();
        let timeout = self.timeout;
        let format = self.format;
        let abort = self.abort.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = abort.cancelled() => {
                    log::debug!("aborted {} {}", method, url);
                }
                event = run_exchange(&method, &url, headers, timeout, format, payload) => {
                    events(event);
                }
            }
        });
    }

    fn abort(&mut self) {
        self.abort.cancel();
    }
}

/// Runs one round-trip and folds every possible ending into a terminal
/// event. Timeouts are recognized through reqwest's own classification; any
/// other failure is a plain `Error` with no detail synthesized.
async fn run_exchange(
    method: &str,
    url: &str,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    format: ResponseFormat,
    payload: Option<Vec<u8>>,
) -> TerminalEvent {
    let method = match reqwest::Method::from_bytes(method.as_bytes()) {
        Ok(m) => m,
        Err(_) => return TerminalEvent::Error,
    };

    let client = reqwest::Client::new();
    let mut builder = client.request(method, url);
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(body) = payload {
        // Opaque bytes; no content-type is invented for them.
        builder = builder.body(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => return TerminalEvent::Timeout,
        Err(err) => {
            log::debug!("exchange failed for {}: {}", url, err);
            return TerminalEvent::Error;
        }
    };

    let status = response.status().as_u16();
    let status_text = response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown")
        .to_string();
    let headers = response.headers().clone();

    match response.bytes().await {
        Ok(bytes) => TerminalEvent::Load(ResponseSnapshot {
            status,
            status_text,
            headers,
            body: materialize(format, bytes.to_vec()),
        }),
        Err(err) if err.is_timeout() => TerminalEvent::Timeout,
        Err(_) => TerminalEvent::Error,
    }
}

/// Converts raw body bytes into the caller-selected format.
fn materialize(format: ResponseFormat, bytes: Vec<u8>) -> ResponseBody {
    match format {
        ResponseFormat::Bytes => ResponseBody::Bytes(bytes),
        ResponseFormat::Blob => ResponseBody::Blob(bytes),
        ResponseFormat::Text => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
        ResponseFormat::Document => {
            ResponseBody::Document(String::from_utf8_lossy(&bytes).into_owned())
        }
        ResponseFormat::Json => {
            ResponseBody::Json(serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
        }
    }
}
