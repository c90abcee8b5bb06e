//! Query-string parameter encoder.

use std::fmt::{self, Display};

/// An ordered multiset of name/value pairs destined for a URL query string.
///
/// Names are not deduplicated: appending the same name twice produces two
/// pairs, in append order. Serialization is pure and repeatable.
///
/// ```
/// let mut params = onereq::Params::new();
/// params.append("a", "1");
/// params.append("b", "2 3");
/// assert_eq!(params.to_query(), "a=1&b=2+3");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one name/value pair, preserving order.
    pub fn append(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    /// Serializes to a percent-encoded query string suitable for use in a
    /// URL (pairs joined by `&`, space encoded as `+`).
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query())
    }
}
