use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marker value returned when an operation observed a cancellation request.
///
/// Cancellation is always distinguished from refusals and from invariant
/// failures; callers that receive `Cancelled` must assume no partial result
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Cooperative cancellation flag shared between a caller and a running
/// pipeline.
///
/// The holder flips the flag; the pipeline polls it at stage and loop
/// boundaries and aborts without leaking partial results.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Convenience for `?`-style early exit at stage boundaries.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_live_and_cancels_once() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Cancelled));
    }
}
