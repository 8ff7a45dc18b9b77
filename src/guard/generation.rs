use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Monotonic run counter shared by every run of one guard.
///
/// Starting a run supersedes all earlier ones; a superseded run must not
/// commit state or fire side effects.
#[derive(Clone, Debug, Default)]
pub struct Generations {
    latest: Arc<AtomicU64>,
}

#[derive(Clone, Debug)]
pub struct Ticket {
    number: u64,
    latest: Arc<AtomicU64>,
}

impl Generations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        let number = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            number,
            latest: Arc::clone(&self.latest),
        }
    }
}

impl Ticket {
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.number
    }
}
