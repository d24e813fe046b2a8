//! Thread-safe event buffer with an atomic drain.

use std::sync::{Mutex, MutexGuard, PoisonError};

use bridge_protocol::{Event, EventBuffer, EventKind};

#[derive(Debug, Default)]
struct Pending {
    buffer: EventBuffer,
    /// First terminal kind recorded since the last drain.
    terminal: Option<EventKind>,
    recorded: u64,
}

/// Collects simulation events between two state reports.
///
/// `record` and `drain` share one lock, so a recorded event lands either
/// entirely before or entirely after any given drain and is reported exactly
/// once. Producers only append under the lock and never wait on I/O.
#[derive(Debug, Default)]
pub struct EventAccumulator {
    pending: Mutex<Pending>,
}

impl EventAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` to the bucket for its kind.
    ///
    /// Safe to call from any thread, concurrently with [`drain`](Self::drain).
    pub fn record(&self, event: Event) {
        let kind = event.kind();
        let mut pending = self.lock();

        if kind.is_terminal() && pending.terminal.is_none() {
            pending.terminal = Some(kind);
        }
        pending.buffer.push(event);
        pending.recorded += 1;

        tracing::trace!(target: "bridge::events", %kind, "event recorded");
    }

    /// Takes every pending event and resets the buffer and terminal latch.
    pub fn drain(&self) -> EventBuffer {
        let mut pending = self.lock();
        pending.terminal = None;
        std::mem::take(&mut pending.buffer)
    }

    /// Terminal kind recorded since the last drain, if any.
    pub fn pending_terminal(&self) -> Option<EventKind> {
        self.lock().terminal
    }

    /// Number of events waiting for the next drain.
    pub fn pending_len(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Total events recorded over the accumulator's lifetime.
    pub fn recorded(&self) -> u64 {
        self.lock().recorded
    }

    // A producer that panicked mid-record cannot leave a half-pushed event,
    // so a poisoned lock still guards a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
