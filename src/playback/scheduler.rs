// PlaybackScheduler - releases chart events onto the playfield in real time
//
// State machine:
//
//   Idle --start--> Running --pause--> Paused --resume--> Running
//   Running --(cursor at end, field drained)--> Complete
//   Idle | Running | Paused --stop--> Stopped
//
// The clock only advances while Running. A forward-only cursor guarantees
// every event is released exactly once and in chart order; there is no
// seeking.

use serde::{Deserialize, Serialize};

use super::arena::TargetId;
use super::field::Playfield;
use crate::chart::Chart;
use crate::error::PlaybackError;

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Complete,
    Stopped,
}

impl SchedulerState {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Paused => "paused",
            SchedulerState::Complete => "complete",
            SchedulerState::Stopped => "stopped",
        }
    }
}

/// Event-release clock for one chart
#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    chart: Chart,
    cursor: usize,
    elapsed: f64,
    state: SchedulerState,
}

impl PlaybackScheduler {
    /// Create an idle scheduler
    ///
    /// # Returns
    /// * `Ok(PlaybackScheduler)` - Ready to start
    /// * `Err(PlaybackError::UnsortedChart)` - Events are not in time order
    pub fn new(chart: Chart) -> Result<Self, PlaybackError> {
        if let Some(index) = chart
            .events
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(PlaybackError::UnsortedChart { index: index + 1 });
        }

        Ok(Self {
            chart,
            cursor: 0,
            elapsed: 0.0,
            state: SchedulerState::Idle,
        })
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Session clock in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Index of the next event to release
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.chart.events.len() - self.cursor
    }

    pub fn start(&mut self) -> Result<(), PlaybackError> {
        self.transition(SchedulerState::Idle, SchedulerState::Running, "start")
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        self.transition(SchedulerState::Running, SchedulerState::Paused, "pause")
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        self.transition(SchedulerState::Paused, SchedulerState::Running, "resume")
    }

    /// Halt the clock and discard every live target without judging it
    pub fn stop(&mut self, field: &mut Playfield) -> Result<(), PlaybackError> {
        match self.state {
            SchedulerState::Idle | SchedulerState::Running | SchedulerState::Paused => {
                let discarded = field.targets().len();
                field.clear();
                self.state = SchedulerState::Stopped;
                tracing::info!(
                    "[Scheduler] Stopped at {:.3}s, discarded {} live targets",
                    self.elapsed,
                    discarded
                );
                Ok(())
            }
            from => Err(PlaybackError::InvalidTransition {
                from: from.as_str(),
                action: "stop",
            }),
        }
    }

    /// Rewind to the beginning of the chart in the Idle state
    pub fn reset(&mut self, field: &mut Playfield) {
        field.clear();
        self.cursor = 0;
        self.elapsed = 0.0;
        self.state = SchedulerState::Idle;
    }

    /// Advance the clock and release every due event
    ///
    /// # Arguments
    /// * `dt` - Seconds since the previous tick
    /// * `field` - Playfield receiving released targets
    ///
    /// # Returns
    /// Ids of the targets released this tick, in chart order. Empty unless
    /// the scheduler is Running.
    pub fn tick(&mut self, dt: f64, field: &mut Playfield) -> Vec<TargetId> {
        if self.state != SchedulerState::Running {
            return Vec::new();
        }
        if !(dt.is_finite() && dt >= 0.0) {
            tracing::warn!("[Scheduler] Ignoring invalid tick delta {}", dt);
        } else {
            self.elapsed += dt;
        }

        let mut released = Vec::new();
        while let Some(event) = self.chart.events.get(self.cursor) {
            if event.time > self.elapsed {
                break;
            }

            if let Some(previous) = self.cursor.checked_sub(1).map(|i| self.chart.events[i]) {
                debug_assert!(
                    previous.time <= event.time,
                    "event {} released out of order",
                    self.cursor
                );
                if previous.time > event.time {
                    tracing::error!(
                        "[Scheduler] Event {} at {:.3}s is earlier than its predecessor at {:.3}s",
                        self.cursor,
                        event.time,
                        previous.time
                    );
                }
            }

            released.push(field.spawn(*event, self.cursor));
            self.cursor += 1;
        }

        if !released.is_empty() {
            tracing::debug!(
                "[Scheduler] Released {} targets at {:.3}s",
                released.len(),
                self.elapsed
            );
        }
        released
    }

    /// Move to Complete once every event is out and the field is drained
    ///
    /// # Returns
    /// `true` if the scheduler is Complete after the check
    pub fn update_completion(&mut self, field: &Playfield) -> bool {
        if self.state == SchedulerState::Running
            && self.cursor >= self.chart.events.len()
            && field.unresolved_count() == 0
        {
            self.state = SchedulerState::Complete;
            tracing::info!("[Scheduler] Chart complete at {:.3}s", self.elapsed);
        }
        self.state == SchedulerState::Complete
    }

    fn transition(
        &mut self,
        from: SchedulerState,
        to: SchedulerState,
        action: &'static str,
    ) -> Result<(), PlaybackError> {
        if self.state != from {
            return Err(PlaybackError::InvalidTransition {
                from: self.state.as_str(),
                action,
            });
        }
        tracing::debug!("[Scheduler] {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }
}
