use std::{collections::BTreeMap, time::Duration};

/// Handle of a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    due: Duration,
    seq: u64,
}

impl TimerHandle {
    #[must_use]
    pub fn due(&self) -> Duration {
        self.due
    }
}

/// Timer queue on a virtual clock.
///
/// The host decides how fast the clock runs; nothing here reads wall time. Tasks due at the
/// same instant fire in the order they were scheduled.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use hexblox_engine::Timers;
///
/// let mut timers = Timers::new();
/// let a = timers.schedule(Duration::from_millis(300), "flash");
/// timers.schedule(Duration::from_millis(100), "fall");
/// assert!(timers.cancel(a));
///
/// let until = Duration::from_millis(500);
/// assert_eq!(timers.pop_due(until), Some("fall"));
/// assert_eq!(timers.pop_due(until), None);
/// timers.advance_to(until);
/// assert_eq!(timers.now(), until);
/// ```
#[derive(Debug, Clone)]
pub struct Timers<T> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<TimerHandle, T>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedules `task` to fire `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        let handle = TimerHandle {
            due: self.now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(handle, task);
        handle
    }

    /// Removes a pending task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.remove(&handle).is_some()
    }

    /// Pops the earliest task due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let entry = self.queue.first_entry()?;
        if entry.key().due > until {
            return None;
        }
        let (handle, task) = entry.remove_entry();
        self.now = self.now.max(handle.due);
        Some(task)
    }

    /// Moves the clock forward to `until`. The clock never runs backwards.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
