//! Deferred tasks
//!
//! The engine never owns a real timer. It queues tasks with a due time and the
//! host drains them by calling `advance`. Each task carries the generation
//! token it was scheduled under; the engine drops it if the token is stale.

/// Work scheduled for later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// One second of countdown for the session with this token
    CountdownTick { session: u64 },
    /// Hide the achievement notification with this token
    ClearNotification { token: u64 },
}

#[derive(Debug, Clone)]
struct Scheduled {
    due_ms: f64,
    seq: u64,
    task: Task,
}

/// Pending tasks ordered by due time, then by scheduling order
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pending: Vec<Scheduled>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled { due_ms, seq, task });
    }

    /// Remove and return the earliest task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(f64, Task)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .partial_cmp(&b.due_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i)?;
        let scheduled = self.pending.swap_remove(index);
        Some((scheduled.due_ms, scheduled.task))
    }

    /// Drop every pending countdown tick
    pub fn cancel_countdowns(&mut self) {
        self.pending
            .retain(|s| !matches!(s.task, Task::CountdownTick { .. }));
    }

    /// Drop every pending notification clear
    pub fn cancel_notification_clears(&mut self) {
        self.pending
            .retain(|s| !matches!(s.task, Task::ClearNotification { .. }));
    }

    pub fn next_due(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|s| s.due_ms)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
