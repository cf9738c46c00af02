use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation shared between a host and a running evaluation.
///
/// Clones observe the same flag. An optional deadline turns the token into
/// a timeout: once it passes, the token reports itself cancelled.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that cancels itself once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { flag: Arc::default(), deadline: Instant::now().checked_add(timeout) }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// A token sharing this one's flag but with no deadline.
    pub fn without_deadline(&self) -> Self {
        Self { flag: self.flag.clone(), deadline: None }
    }
}
