use std::cell::Cell;
use std::rc::Rc;

/// Generation stamp for asynchronous scene work.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceEpoch(pub u64);

impl std::fmt::Display for ResourceEpoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared generation counter.
///
/// Clones observe the same counter. Advancing it invalidates every
/// [`EpochToken`] handed out before the advance.
///
/// Single-threaded by construction (`Rc<Cell<_>>`): tokens travel with
/// `spawn_local` futures, never across threads.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter {
    current: Rc<Cell<u64>>,
}

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ResourceEpoch {
        ResourceEpoch(self.current.get())
    }

    /// Start a new generation. Returns the new current epoch.
    pub fn advance(&self) -> ResourceEpoch {
        let next = self.current.get().wrapping_add(1);
        self.current.set(next);
        ResourceEpoch(next)
    }

    /// Capture the current generation.
    pub fn token(&self) -> EpochToken {
        EpochToken {
            epoch: self.current(),
            counter: self.clone(),
        }
    }
}

/// The epoch captured when a piece of asynchronous work started.
#[derive(Debug, Clone)]
pub struct EpochToken {
    epoch: ResourceEpoch,
    counter: EpochCounter,
}

impl EpochToken {
    pub fn epoch(&self) -> ResourceEpoch {
        self.epoch
    }

    pub fn is_current(&self) -> bool {
        self.counter.current() == self.epoch
    }

    pub fn is_stale(&self) -> bool {
        !self.is_current()
    }
}
