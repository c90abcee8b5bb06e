//! First-write-wins completion slot.
//!
//! Bridges N-shot asynchronous notifications into a one-shot result: every
//! event source holds a clone of the slot and attempts a write; only the
//! first write is delivered to the single waiting consumer, and every later
//! write is a non-blocking no-op. A late event from a transport that lost
//! the race (e.g. a `load` arriving after the caller already cancelled) must
//! never block its delivery thread or queue a stale result.

use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::transport::TerminalEvent;

/// Write side of the slot, shared behind an `Arc` between the transport's
/// event delivery context and anything else racing for the outcome.
pub struct CompletionSlot {
    tx: Mutex<Option<oneshot::Sender<TerminalEvent>>>,
}

impl CompletionSlot {
    /// Creates a slot and the receiver its first write will resolve.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<TerminalEvent>) {
        let (tx, rx) = oneshot::channel();
        (Arc::new(Self { tx: Mutex::new(Some(tx)) }), rx)
    }

    /// Attempts to deliver `event`. Returns `true` if this call won the
    /// race. Never blocks: once the sender has been consumed (or the
    /// receiver dropped) the event is silently discarded.
    pub fn complete(&self, event: TerminalEvent) -> bool {
        let sender = self.tx.lock().unwrap().take();
        match sender {
            // send() fails only when the receiver is gone; the event is
            // stale either way.
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}
