//! Tick scheduling for running task timers. The engine only decides *when* a tick is due; the
//! session loop owns the tasks and applies the tick.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// No task is running, nothing is scheduled.
    Idle,
    Running { next_tick: Instant },
}

/// Edge the engine crossed while observing the running-task count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

pub struct TimerEngine {
    state: TimerState,
    interval: Duration,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl TimerEngine {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: TimerState::Idle,
            interval,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Moves between states only when the running count crosses zero. While running, changes in
    /// how many tasks run keep the current tick phase.
    pub fn observe(&mut self, running: usize, now: Instant) -> Option<Transition> {
        match (self.state, running) {
            (TimerState::Idle, 0) | (TimerState::Running { .. }, 1..) => None,
            (TimerState::Idle, _) => {
                self.state = TimerState::Running {
                    next_tick: now + self.interval,
                };
                debug!("Timer started with {running} running tasks");
                Some(Transition::Started)
            }
            (TimerState::Running { .. }, 0) => {
                self.state = TimerState::Idle;
                debug!("Timer stopped, no running tasks left");
                Some(Transition::Stopped)
            }
        }
    }

    /// When the next tick is due. `None` while idle.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Idle => None,
            TimerState::Running { next_tick } => Some(next_tick),
        }
    }

    /// Schedules the tick after the one that just fired. The schedule is anchored to the previous
    /// deadline, not to when the tick was handled, so a late wakeup doesn't shift later ticks.
    pub fn complete_tick(&mut self) {
        if let TimerState::Running { next_tick } = &mut self.state {
            *next_tick += self.interval;
        }
    }

    /// Tears the engine down; nothing is due afterwards.
    pub fn stop(&mut self) {
        if self.state != TimerState::Idle {
            debug!("Timer torn down while running");
        }
        self.state = TimerState::Idle;
    }
}
