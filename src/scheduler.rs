//! Cooperative task scheduler.
//!
//! Fires the node's periodic work from a single-threaded loop.  Each task
//! has an interval and a last-fired timestamp; [`Scheduler::tick`] compares
//! them against the monotonic clock and hands due tasks to a
//! [`SchedulerDelegate`].  The delegate can gate a task off (the arena tick
//! outside arena mode); a gated task is skipped and its timer advances, so
//! no missed runs pile up.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  main loop ── now_ms ──▶ Scheduler.tick()                    │
//! │                            │                                 │
//! │   ┌───────────┐ ┌──────────┴┐ ┌───────────┐ ┌───────────┐    │
//! │   │ Heartbeat │ │ ArenaTick │ │ MoodDecay │ │ AutoSave  │    │
//! │   │   5 min   │ │ 5 s gated │ │   1 min   │ │   5 min   │    │
//! │   └─────┬─────┘ └─────┬─────┘ └─────┬─────┘ └─────┬─────┘    │
//! │         ▼             ▼             ▼             ▼          │
//! │   ┌────────────────────────────────────────────────────────┐ │
//! │   │   SchedulerDelegate  (is_enabled → on_task_due)        │ │
//! │   └────────────────────────────────────────────────────────┘ │
//! │                                                              │
//! │   EggCheck rides on Heartbeat: recorded via mark_fired()     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler never blocks; a slow task delays the next tick but is
//! never re-entered.

use log::{debug, info};

use crate::app::ports::SchedulerDelegate;
use crate::config::NodeConfig;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Heartbeat,
    ArenaTick,
    MoodDecay,
    AutoSave,
    /// Evaluated inside the heartbeat cycle, never fired on its own.
    EggCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Due once `interval_ms` has elapsed since the last run.
    Every { interval_ms: u64 },
    /// Run as part of another task; only the timestamp is tracked here.
    Piggyback,
}

#[derive(Debug, Clone, Copy)]
pub struct Task {
    pub id: TaskId,
    pub label: &'static str,
    pub cadence: Cadence,
    /// Due on the first tick instead of one interval after start.
    pub run_on_start: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of registered tasks (stack-allocated).
const MAX_TASKS: usize = 6;

#[derive(Debug, Clone, Copy)]
struct TaskEntry {
    task: Task,
    /// Reference point for the first interval.
    started_ms: u64,
    last_fired_ms: Option<u64>,
}

impl TaskEntry {
    fn is_due(&self, now_ms: u64) -> bool {
        let Cadence::Every { interval_ms } = self.task.cadence else {
            return false;
        };
        match self.last_fired_ms {
            Some(last) => now_ms.saturating_sub(last) >= interval_ms,
            None if self.task.run_on_start => true,
            None => now_ms.saturating_sub(self.started_ms) >= interval_ms,
        }
    }
}

pub struct Scheduler {
    tasks: [Option<TaskEntry>; MAX_TASKS],
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: [None; MAX_TASKS],
        }
    }

    /// The node's standard task table.
    pub fn from_config(config: &NodeConfig, now_ms: u64) -> Self {
        let mut sched = Self::new();
        let every = |ms: u32| Cadence::Every {
            interval_ms: ms as u64,
        };
        let table = [
            Task {
                id: TaskId::Heartbeat,
                label: "heartbeat",
                cadence: every(config.heartbeat_interval_ms),
                run_on_start: true,
            },
            Task {
                id: TaskId::ArenaTick,
                label: "arena-tick",
                cadence: every(config.arena_tick_interval_ms),
                run_on_start: false,
            },
            Task {
                id: TaskId::MoodDecay,
                label: "mood-decay",
                cadence: every(config.mood_decay_interval_ms),
                run_on_start: false,
            },
            Task {
                id: TaskId::AutoSave,
                label: "auto-save",
                cadence: every(config.auto_save_interval_ms),
                run_on_start: false,
            },
            Task {
                id: TaskId::EggCheck,
                label: "egg-check",
                cadence: Cadence::Piggyback,
                run_on_start: false,
            },
        ];
        for task in table {
            sched.add(task, now_ms);
        }
        sched
    }

    /// Register a task.  Returns the slot index, or `None` if full or the
    /// id is already registered.
    pub fn add(&mut self, task: Task, now_ms: u64) -> Option<usize> {
        if self.entry(task.id).is_some() {
            return None;
        }
        let (i, slot) = self
            .tasks
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())?;
        info!("Scheduler: added '{}' at slot {}", task.label, i);
        *slot = Some(TaskEntry {
            task,
            started_ms: now_ms,
            last_fired_ms: None,
        });
        Some(i)
    }

    /// Record a run that happened outside [`tick`](Self::tick): a manual
    /// trigger, or a piggybacked task.
    pub fn mark_fired(&mut self, id: TaskId, now_ms: u64) {
        if let Some(entry) = self.entry_mut(id) {
            entry.last_fired_ms = Some(now_ms);
        }
    }

    pub fn last_fired(&self, id: TaskId) -> Option<u64> {
        self.entry(id).and_then(|e| e.last_fired_ms)
    }

    /// Milliseconds until `id` is next due (0 when due now).
    pub fn due_in(&self, id: TaskId, now_ms: u64) -> Option<u64> {
        let entry = self.entry(id)?;
        let Cadence::Every { interval_ms } = entry.task.cadence else {
            return None;
        };
        let anchor = match entry.last_fired_ms {
            Some(last) => last,
            None if entry.task.run_on_start => return Some(0),
            None => entry.started_ms,
        };
        Some((anchor + interval_ms).saturating_sub(now_ms))
    }

    /// Run every due task, in registration order.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.tasks.iter_mut().flatten() {
            if !entry.is_due(now_ms) {
                continue;
            }
            entry.last_fired_ms = Some(now_ms);
            if delegate.is_enabled(entry.task.id) {
                debug!("Scheduler: '{}' due", entry.task.label);
                delegate.on_task_due(entry.task.id, now_ms);
            } else {
                debug!("Scheduler: '{}' gated off, skipped", entry.task.label);
            }
        }
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.iter().flatten().count()
    }

    fn entry(&self, id: TaskId) -> Option<&TaskEntry> {
        self.tasks.iter().flatten().find(|e| e.task.id == id)
    }

    fn entry_mut(&mut self, id: TaskId) -> Option<&mut TaskEntry> {
        self.tasks.iter_mut().flatten().find(|e| e.task.id == id)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
