//! Status-class predicates.
//!
//! Pure range checks over a numeric status code. They never consult the
//! request lifecycle: a request that has not completed reports status `0`,
//! which falls outside every class and therefore yields `false` from all
//! three predicates.

/// Returns true for a 2xx status code (200–299 inclusive).
pub fn is_2xx(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Returns true for a 4xx status code (400–499 inclusive).
pub fn is_4xx(status: u16) -> bool {
    (400..=499).contains(&status)
}

/// Returns true for a 5xx status code (500–599 inclusive).
pub fn is_5xx(status: u16) -> bool {
    (500..=599).contains(&status)
}
