//! Continuous estimation on a worker thread.
//!
//! `BackgroundSearch` owns the estimator while it runs; `stop` raises the
//! cancellation flag and joins, handing the estimator back.

use crate::estimator::Estimator;
use gomoku_core::{GomokuError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Cooperative cancellation flag shared between a controller and a search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// An estimator running `estimate_once` in a loop on its own thread.
pub struct BackgroundSearch<E: Estimator + 'static> {
    cancel: CancelToken,
    handle: JoinHandle<(E, Result<()>)>,
}

impl<E: Estimator + 'static> BackgroundSearch<E> {
    /// Start estimating until cancelled or `estimator.is_ready(playout_target)`.
    ///
    /// Pass `u32::MAX` to run until [`BackgroundSearch::stop`].
    pub fn start(mut estimator: E, playout_target: u32) -> Self {
        let cancel = CancelToken::new();
        estimator.attach_cancel(cancel.clone());
        let token = cancel.clone();

        let handle = thread::spawn(move || {
            while !token.is_cancelled() && !estimator.is_ready(playout_target) {
                if let Err(e) = estimator.estimate_once() {
                    return (estimator, Err(e));
                }
            }
            (estimator, Ok(()))
        });

        Self { cancel, handle }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal cancellation and join, returning the estimator.
    pub fn stop(self) -> Result<E> {
        self.cancel.cancel();
        self.join()
    }

    /// Join without cancelling.
    pub fn wait(self) -> Result<E> {
        self.join()
    }

    fn join(self) -> Result<E> {
        let (mut estimator, outcome) = self
            .handle
            .join()
            .map_err(|_| GomokuError::WorkerPanicked)?;
        estimator.attach_cancel(CancelToken::new());
        outcome?;
        Ok(estimator)
    }
}
