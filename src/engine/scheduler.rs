//! Cooperative timer queue.
//!
//! There are no threads here: whoever owns the queue asks it for due timers
//! as audio time advances. A [`TimerHandle`] identifies one scheduled firing
//! and cancelling it guarantees it will never be returned.

/// Identifies one scheduled firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    deadline: f64,
    handle: TimerHandle,
    task: T,
}

/// A timer that fired: its handle, deadline and payload.
#[derive(Debug, PartialEq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    pub deadline: f64,
    pub task: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    /// Sorted by deadline, then by insertion order
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, deadline: f64, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;

        let idx = self.entries.partition_point(|e| e.deadline <= deadline);
        self.entries.insert(
            idx,
            Entry {
                deadline,
                handle,
                task,
            },
        );
        handle
    }

    /// Returns the task if it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let idx = self.entries.iter().position(|e| e.handle == handle)?;
        Some(self.entries.remove(idx).task)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.entries.first().map(|e| e.deadline)
    }

    /// Pop the earliest timer whose deadline is before `until`.
    pub fn pop_due(&mut self, until: f64) -> Option<Fired<T>> {
        match self.entries.first() {
            Some(entry) if entry.deadline < until => {
                let entry = self.entries.remove(0);
                Some(Fired {
                    handle: entry.handle,
                    deadline: entry.deadline,
                    task: entry.task,
                })
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds at most one pending timer; arming it again cancels the previous one.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<TimerHandle>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self { handle: None }
    }

    pub fn arm<T>(&mut self, queue: &mut TimerQueue<T>, deadline: f64, task: T) -> TimerHandle {
        self.cancel(queue);
        let handle = queue.schedule(deadline, task);
        self.handle = Some(handle);
        handle
    }

    pub fn cancel<T>(&mut self, queue: &mut TimerQueue<T>) {
        if let Some(handle) = self.handle.take() {
            queue.cancel(handle);
        }
    }

    /// True if `handle` is the timer this slot is waiting on. Fired timers
    /// from an earlier arming are stale and should be ignored.
    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.handle == Some(handle)
    }

    /// Mark the current timer as fired.
    pub fn clear(&mut self) {
        self.handle = None;
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}
