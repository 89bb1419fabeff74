// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting timer state machine.
//!
//! The timer does no I/O and never reads the clock itself: every transition
//! takes the current instant. Elapsed time is always derived from wall-clock
//! deltas, so a late or skipped tick only delays event delivery and never
//! skews the measured duration.
//!
//! ```text
//! Idle ──start──▶ Active ──tick (elapsed ≥ target)──▶ Completed
//!                  │  ▲
//!            pause │  │ resume
//!                  ▼  │
//!                 Paused
//! Active | Paused ──stop──▶ Stopped
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const SECS_PER_HOUR: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Active,
    Paused,
    Completed,
    Stopped,
}

impl TimerState {
    /// Whether the timer is still counting (or could count again).
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Active | TimerState::Paused)
    }
}

/// Signals produced by [`FastingTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A whole hour of fasting has passed.
    Hourly { hours: u64 },
    /// Elapsed time reached the target duration.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("a fasting session is already in progress")]
    AlreadyActive,
    #[error("no fasting session is running")]
    NotActive,
    #[error("the fasting session is not paused")]
    NotPaused,
    #[error("the fasting session has already finished")]
    Finished,
}

#[derive(Debug, Clone)]
pub struct FastingTimer {
    state: TimerState,
    target_secs: u64,
    started_at: Option<DateTime<Utc>>,
    /// `now - elapsed` for the current run; moves forward on every resume.
    effective_start: Option<DateTime<Utc>>,
    /// Elapsed value frozen while paused or finished.
    frozen_elapsed: u64,
    hours_signalled: u64,
    finished_at: Option<DateTime<Utc>>,
}

impl FastingTimer {
    pub fn new(target_secs: u64) -> Self {
        Self {
            state: TimerState::Idle,
            target_secs,
            started_at: None,
            effective_start: None,
            frozen_elapsed: 0,
            hours_signalled: 0,
            finished_at: None,
        }
    }

    /// Rebuild a running timer from a persisted start instant.
    ///
    /// Hours that already passed are treated as signalled.
    pub fn restore(started_at: DateTime<Utc>, target_secs: u64, now: DateTime<Utc>) -> Self {
        let mut timer = Self::new(target_secs);
        timer.state = TimerState::Active;
        timer.started_at = Some(started_at);
        timer.effective_start = Some(started_at);
        timer.hours_signalled = timer.elapsed_secs(now) / SECS_PER_HOUR;
        timer
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn target_secs(&self) -> u64 {
        self.target_secs
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::AlreadyActive);
        }
        self.state = TimerState::Active;
        self.started_at = Some(now);
        self.effective_start = Some(now);
        self.frozen_elapsed = 0;
        self.hours_signalled = 0;
        Ok(())
    }

    /// Elapsed fasting time in whole seconds.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match (self.state, self.effective_start) {
            (TimerState::Active, Some(start)) => (now - start).num_seconds().max(0) as u64,
            (TimerState::Idle, _) => 0,
            _ => self.frozen_elapsed,
        }
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        self.target_secs.saturating_sub(self.elapsed_secs(now))
    }

    /// Advance the timer. Only an active timer produces events.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        if self.state != TimerState::Active {
            return Vec::new();
        }

        let elapsed = self.elapsed_secs(now);
        let hours = elapsed / SECS_PER_HOUR;
        let mut events: Vec<TimerEvent> = (self.hours_signalled + 1..=hours)
            .map(|hours| TimerEvent::Hourly { hours })
            .collect();
        self.hours_signalled = self.hours_signalled.max(hours);

        if elapsed >= self.target_secs {
            self.finish(TimerState::Completed, elapsed, now);
            events.push(TimerEvent::Completed);
        }

        events
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match self.state {
            TimerState::Active => {
                self.frozen_elapsed = self.elapsed_secs(now);
                self.state = TimerState::Paused;
                Ok(())
            }
            TimerState::Completed | TimerState::Stopped => Err(TimerError::Finished),
            _ => Err(TimerError::NotActive),
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match self.state {
            TimerState::Paused => {
                self.effective_start = Some(now - Duration::seconds(self.frozen_elapsed as i64));
                self.state = TimerState::Active;
                Ok(())
            }
            TimerState::Completed | TimerState::Stopped => Err(TimerError::Finished),
            _ => Err(TimerError::NotPaused),
        }
    }

    /// Finalize regardless of target. Returns the total elapsed seconds.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<u64, TimerError> {
        match self.state {
            TimerState::Active | TimerState::Paused => {
                let elapsed = self.elapsed_secs(now);
                self.finish(TimerState::Stopped, elapsed, now);
                Ok(elapsed)
            }
            TimerState::Idle => Err(TimerError::NotActive),
            TimerState::Completed | TimerState::Stopped => Err(TimerError::Finished),
        }
    }

    fn finish(&mut self, state: TimerState, elapsed: u64, now: DateTime<Utc>) {
        self.state = state;
        self.frozen_elapsed = elapsed;
        // End never precedes start, even if the clock stepped backwards.
        self.finished_at = Some(match self.started_at {
            Some(start) if start > now => start,
            _ => now,
        });
    }
}
