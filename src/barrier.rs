use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts outstanding work and reports the single decrement that finishes it.
///
/// The count is fixed when the barrier is built and cannot be reset. Exactly
/// one call to [`CompletionBarrier::decrement`] observes
/// [`Release::Released`], no matter how many threads decrement concurrently.
#[derive(Debug)]
pub struct CompletionBarrier {
    remaining: AtomicUsize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Work is still outstanding.
    Pending(usize),
    /// This decrement completed the last piece of work.
    Released,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BarrierError {
    #[error("more completions were reported than work was expected")]
    Overrun,
}

impl CompletionBarrier {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.remaining() == 0
    }

    pub fn decrement(&self) -> Result<Release, BarrierError> {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                remaining.checked_sub(1)
            })
            .map_err(|_| BarrierError::Overrun)?;
        match previous - 1 {
            0 => Ok(Release::Released),
            remaining => Ok(Release::Pending(remaining)),
        }
    }
}
