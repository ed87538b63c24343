//! Request-generation guard for superseded fetches.
//!
//! Every fetch a view starts gets a fresh [`Generation`]. When a response
//! arrives, the view applies it only if its generation is still the latest one
//! issued; a slow response for an earlier navigation is dropped instead of
//! overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Rebuild a ticket from a value handed across an FFI boundary.
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic counter of issued requests for one view.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation, superseding all earlier ones.
    pub fn issue(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `generation` is the most recently issued one.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::Acquire) == generation.0
    }

    /// Pass `value` through only if `generation` is current.
    pub fn accept<T>(&self, generation: Generation, value: T) -> Option<T> {
        self.is_current(generation).then_some(value)
    }

    /// Supersede every outstanding request without starting a new one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}
