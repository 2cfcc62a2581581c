//! Countdown clock gating when points may be assigned in a round.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info};

/// Length of one scoring round.
pub const ROUND_DURATION_SECS: u32 = 60;
const TICK: Duration = Duration::from_secs(1);

/// Coarse state of the round clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// Not counting; either fresh or paused with time left.
    Idle,
    /// Counting down.
    Running,
    /// Reached zero. Points may be assigned.
    Completed,
}

/// Observable state of the round clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    /// Seconds left in the round.
    pub remaining_secs: u32,
    /// A countdown task is ticking.
    pub running: bool,
    /// Reached zero; stays set until reset.
    pub completed: bool,
}

impl TimerSnapshot {
    /// Full round loaded, not started.
    pub fn idle() -> Self {
        Self {
            remaining_secs: ROUND_DURATION_SECS,
            running: false,
            completed: false,
        }
    }

    /// Coarse status derived from the flags.
    pub fn status(&self) -> TimerStatus {
        if self.completed {
            TimerStatus::Completed
        } else if self.running {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Round countdown backed by a single tokio task.
///
/// At most one countdown task exists at a time. Every transition that stops the
/// clock aborts the task and bumps `generation`; ticks compare their own
/// generation before mutating, so a tick from a superseded countdown never
/// lands in the current round.
#[derive(Debug)]
pub struct RoundTimer {
    state: Arc<watch::Sender<TimerSnapshot>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl RoundTimer {
    /// Idle clock holding a full round.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TimerSnapshot::idle());
        Self {
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Current clock state.
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.state.borrow()
    }

    /// Whether the round reached zero.
    pub fn is_completed(&self) -> bool {
        self.state.borrow().completed
    }

    /// Receive every change of the clock, including each tick.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.state.subscribe()
    }

    /// Begin counting down from the current remaining time.
    ///
    /// Returns `false` without doing anything when the clock is already running
    /// or has completed. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> bool {
        let current = self.snapshot();
        if current.running || current.completed {
            return false;
        }

        self.cancel_task();
        let generation = self.generation.load(Ordering::Acquire);
        self.state.send_modify(|snapshot| snapshot.running = true);

        let state = Arc::clone(&self.state);
        let live_generation = Arc::clone(&self.generation);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let mut superseded = false;
                let mut completed = false;
                state.send_if_modified(|snapshot| {
                    if live_generation.load(Ordering::Acquire) != generation {
                        superseded = true;
                        return false;
                    }
                    snapshot.remaining_secs = snapshot.remaining_secs.saturating_sub(1);
                    if snapshot.remaining_secs == 0 {
                        snapshot.running = false;
                        snapshot.completed = true;
                        completed = true;
                    }
                    true
                });

                if completed {
                    info!("round timer completed; points may now be assigned");
                }
                if superseded || completed {
                    break;
                }
            }
        }));

        debug!(remaining = current.remaining_secs, "round timer started");
        true
    }

    /// Stop the countdown keeping the remaining time. No-op unless running.
    pub fn pause(&mut self) -> bool {
        if !self.snapshot().running {
            return false;
        }

        self.cancel_task();
        self.state.send_modify(|snapshot| snapshot.running = false);
        debug!(remaining = self.snapshot().remaining_secs, "round timer paused");
        true
    }

    /// Cancel any countdown and load a fresh round.
    pub fn reset(&mut self) {
        self.cancel_task();
        self.state.send_replace(TimerSnapshot::idle());
        debug!("round timer reset");
    }

    fn cancel_task(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.cancel_task();
    }
}
