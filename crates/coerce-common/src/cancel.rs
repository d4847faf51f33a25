//! Cooperative cancellation.
//!
//! Classification itself is cheap and never checks for cancellation. The
//! inference engine (best common type, method type inference) can iterate over
//! thousands of candidate expressions and polls a token supplied by the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Counts units of work and polls a token every `interval` units.
#[derive(Debug)]
pub struct CancellationPoller<'a> {
    token: &'a CancellationToken,
    interval: u32,
    ticks: u32,
}

impl<'a> CancellationPoller<'a> {
    pub fn new(token: &'a CancellationToken, interval: u32) -> Self {
        Self {
            token,
            interval: interval.max(1),
            ticks: 0,
        }
    }

    /// Record one unit of work; returns `true` once cancellation is observed.
    ///
    /// The first tick always polls, so an already-cancelled token stops work
    /// before any of it is done.
    pub fn tick(&mut self) -> bool {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks == 1 || self.ticks % self.interval == 0 {
            return self.token.is_cancelled();
        }
        false
    }
}

#[cfg(test)]
#[path = "../tests/cancel_tests.rs"]
mod tests;
