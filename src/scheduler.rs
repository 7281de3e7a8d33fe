//! Cooperative one-shot task scheduling
//!
//! The engine is single-threaded and tick-driven; the two delays in the
//! signal lifecycle (analysis latency before publication, settlement display
//! before the live slot clears) are modeled as tasks due at a future tick
//! instead of opaque timers. Tasks are never cancelled: a reset simply stops
//! issuing ticks and any outstanding task fires as a no-op against cleared
//! state, which each task variant guards for at execution time.

/// A scheduled continuation of the signal lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Publish the signal under analysis. No-op if a live signal appeared
    /// in the meantime.
    PublishSignal,
    /// Clear the live slot once the settlement display window elapses.
    /// No-op unless the slot still holds this exact terminal signal.
    ClearSettledSignal { signal_id: u32 },
}

/// FIFO queue of `(due_tick, task)` pairs.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: Vec<(u64, Task)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_tick: u64, task: Task) {
        self.queue.push((due_tick, task));
    }

    /// Removes and returns every task due at or before `tick`, preserving
    /// scheduling order among them.
    pub fn take_due(&mut self, tick: u64) -> Vec<Task> {
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.queue.len());
        for (due_tick, task) in self.queue.drain(..) {
            if due_tick <= tick {
                due.push(task);
            } else {
                remaining.push((due_tick, task));
            }
        }
        self.queue = remaining;
        due
    }

    /// Whether any pending task matches the predicate. Used to reject
    /// re-entrant signal generation while analysis is still pending.
    pub fn has_pending(&self, predicate: impl Fn(&Task) -> bool) -> bool {
        self.queue.iter().any(|(_, task)| predicate(task))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
