//! Response snapshot model.
//!
//! A fully buffered view of one completed exchange: status code + reason,
//! response headers, and the body materialized in the format the caller
//! selected before sending. Carried inside
//! [`TerminalEvent::Load`](crate::transport::TerminalEvent::Load) so that no
//! shared mutable response state exists between the transport's delivery
//! context and the waiting caller.

use http::HeaderMap;

/// Response body in the caller-selected format.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Raw bytes, unmodified.
    Bytes(Vec<u8>),
    /// UTF-8 text (lossy-decoded when the body was not valid UTF-8).
    Text(String),
    /// Raw markup of a document response.
    Document(String),
    /// Parsed JSON; `null` when the body failed to parse.
    Json(serde_json::Value),
    /// Opaque binary blob.
    Blob(Vec<u8>),
}

impl ResponseBody {
    /// The body as bytes. Lossless for byte-backed formats; text-backed
    /// formats are re-encoded as UTF-8 and a JSON body is re-serialized.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            ResponseBody::Bytes(b) | ResponseBody::Blob(b) => b.clone(),
            ResponseBody::Text(s) | ResponseBody::Document(s) => s.as_bytes().to_vec(),
            ResponseBody::Json(v) => v.to_string().into_bytes(),
        }
    }
}

/// All fields reflect the received response as-is; no interpretation of the
/// status code is performed by this type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    /// Numeric HTTP status code (e.g. `200`, `404`).
    pub status: u16,

    /// Reason phrase (e.g. `"OK"`). May be `"Unknown"` for non-standard
    /// codes.
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Body in the selected format.
    pub body: ResponseBody,
}

impl ResponseSnapshot {
    /// The value of one response header, or `""` when absent or not
    /// representable as text.
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    }

    /// All response headers as a newline-delimited `Name: Value` blob, in
    /// map order.
    pub fn headers_blob(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.headers.iter() {
            out.push_str(name.as_str());
            out.push_str(": ");
            out.push_str(value.to_str().unwrap_or(""));
            out.push('\n');
        }
        out
    }
}
