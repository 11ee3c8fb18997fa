//! Cooperative cancellation for long sweeps.
//!
//! A [`Checkpoint`] is ticked once per timestamp step. Every `slice_len`
//! steps it reports progress and checks its [`CancellationToken`]; between
//! slice boundaries the analysis runs uninterrupted, so where the boundaries
//! fall never changes the output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tc_common::{Error, Result};

/// Default number of steps between cancellation checks.
pub const DEFAULT_SLICE_LEN: usize = 1000;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Slice-boundary bookkeeping for one analysis pass.
pub struct Checkpoint<'a> {
    token: Option<&'a CancellationToken>,
    slice_len: usize,
    steps_done: usize,
    progress: Option<&'a dyn Fn(usize)>,
}

impl<'a> Checkpoint<'a> {
    /// A checkpoint that never cancels and never reports.
    pub fn unbounded() -> Self {
        Checkpoint {
            token: None,
            slice_len: DEFAULT_SLICE_LEN,
            steps_done: 0,
            progress: None,
        }
    }

    /// Check `token` every `slice_len` steps (a zero length checks every step).
    pub fn new(token: &'a CancellationToken, slice_len: usize) -> Self {
        Checkpoint {
            token: Some(token),
            slice_len: slice_len.max(1),
            steps_done: 0,
            progress: None,
        }
    }

    /// Report the number of steps done at every slice boundary.
    pub fn with_progress(mut self, progress: &'a dyn Fn(usize)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fail fast if cancellation was requested before any work.
    pub fn check(&self) -> Result<()> {
        match self.token {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled {
                steps_done: self.steps_done,
            }),
            _ => Ok(()),
        }
    }

    /// Count one step; at slice boundaries report progress and honour cancellation.
    pub fn tick(&mut self) -> Result<()> {
        self.steps_done += 1;
        if self.steps_done % self.slice_len != 0 {
            return Ok(());
        }
        if let Some(progress) = self.progress {
            progress(self.steps_done);
        }
        if self.token.is_some_and(|t| t.is_cancelled()) {
            tracing::debug!(steps_done = self.steps_done, "sweep cancelled at slice boundary");
            return Err(Error::Cancelled {
                steps_done: self.steps_done,
            });
        }
        Ok(())
    }

    pub fn steps_done(&self) -> usize {
        self.steps_done
    }
}

impl Default for Checkpoint<'_> {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_unbounded_never_cancels() {
        let mut cp = Checkpoint::unbounded();
        for _ in 0..10_000 {
            cp.tick().unwrap();
        }
        assert_eq!(cp.steps_done(), 10_000);
    }

    #[test]
    fn test_cancel_observed_only_at_slice_boundary() {
        let token = CancellationToken::new();
        let mut cp = Checkpoint::new(&token, 4);
        cp.tick().unwrap();
        token.cancel();
        cp.tick().unwrap();
        cp.tick().unwrap();
        let err = cp.tick().unwrap_err();
        assert!(matches!(err, Error::Cancelled { steps_done: 4 }));
    }

    #[test]
    fn test_check_before_work() {
        let token = CancellationToken::new();
        token.cancel();
        let cp = Checkpoint::new(&token, 10);
        assert!(cp.check().is_err());
    }

    #[test]
    fn test_clones_share_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_progress_reported_per_slice() {
        let seen = RefCell::new(Vec::new());
        let report = |n: usize| seen.borrow_mut().push(n);
        let token = CancellationToken::new();
        let mut cp = Checkpoint::new(&token, 3).with_progress(&report);
        for _ in 0..7 {
            cp.tick().unwrap();
        }
        assert_eq!(*seen.borrow(), vec![3, 6]);
    }
}
