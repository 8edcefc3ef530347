// AutoPlayer - deterministic bot for simulations and tests
//
// Strikes the nearest target of each lane once it reaches STRIKE_LEAD before
// the strike line. Keys mode emits press/release edges, instruments mode
// emits a swing pose on the target along its required direction.

use glam::Vec3;

use super::GameSession;
use crate::chart::Lane;
use crate::judgment::{HitIntent, InstrumentPose, SessionSummary};
use crate::playback::field::{spawn_position, strike_offset, STRIKE_Z, WINDOW_LATE};
use crate::playback::{LiveTarget, Playfield};

/// Offset before the strike line at which the bot strikes
const STRIKE_LEAD: f32 = -0.1;

/// Length of a synthesized swing
const SWING_LENGTH: f32 = 0.2;

/// Extra seconds simulated past the last target's miss deadline
const RUN_MARGIN_SECS: f64 = 2.0;

/// Input model the bot plays with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoPlayMode {
    #[default]
    Keys,
    Instruments,
}

/// Scripted player
#[derive(Debug, Clone, Default)]
pub struct AutoPlayer {
    mode: AutoPlayMode,
    /// Deliberately let every k-th chart event pass
    miss_every: Option<u32>,
    held: [bool; 2],
}

impl AutoPlayer {
    pub fn new(mode: AutoPlayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Skip every `k`-th chart event (1-based); 0 disables skipping
    pub fn with_miss_every(mut self, k: u32) -> Self {
        self.miss_every = (k > 0).then_some(k);
        self
    }

    pub fn mode(&self) -> AutoPlayMode {
        self.mode
    }

    /// Key edges for the current field state
    ///
    /// Lanes pressed on the previous call are released first.
    pub fn intents(&mut self, field: &Playfield) -> Vec<HitIntent> {
        let mut intents = Vec::new();
        for lane in Lane::ALL {
            let held = &mut self.held[lane.index()];
            if *held {
                intents.push(HitIntent::released(lane));
                *held = false;
            }
        }

        for lane in Lane::ALL {
            if self.strike_candidate(field, lane).is_some() {
                intents.push(HitIntent::pressed(lane));
                self.held[lane.index()] = true;
            }
        }
        intents
    }

    /// One pose per instrument for the current field state
    pub fn poses(&self, field: &Playfield) -> Vec<InstrumentPose> {
        Lane::ALL
            .iter()
            .map(|&lane| match self.strike_candidate(field, lane) {
                Some(target) => {
                    let motion = match target.event.direction.vector() {
                        Some(direction) => direction.normalize().extend(0.0) * SWING_LENGTH,
                        None => Vec3::NEG_Y * SWING_LENGTH,
                    };
                    pose_at(lane, target.position, motion)
                }
                None => {
                    // Resting behind the strike line, out of reach of any target
                    let mut rest = spawn_position(lane);
                    rest.z = STRIKE_Z + WINDOW_LATE + 3.0;
                    pose_at(lane, rest, Vec3::ZERO)
                }
            })
            .collect()
    }

    /// Feed this frame's input and tick the session
    pub fn step(&mut self, game: &mut GameSession, dt: f64) -> super::TickReport {
        match self.mode {
            AutoPlayMode::Keys => {
                for intent in self.intents(game.field()) {
                    game.push_intent(intent);
                }
                game.tick(dt, &[])
            }
            AutoPlayMode::Instruments => {
                let poses = self.poses(game.field());
                game.tick(dt, &poses)
            }
        }
    }

    /// Play a started session at a fixed frame time until it finishes
    ///
    /// # Arguments
    /// * `game` - Session in the Running state
    /// * `dt` - Frame time in seconds
    ///
    /// # Returns
    /// Session summary once the chart completes, or after the last target's
    /// miss deadline plus a margin if it never does
    pub fn run(&mut self, game: &mut GameSession, dt: f64) -> SessionSummary {
        if dt > 0.0 && dt.is_finite() {
            let travel = game.field().travel_time() + (WINDOW_LATE / game.field().speed()) as f64;
            let horizon = game.chart().last_event_time() + travel + RUN_MARGIN_SECS;
            let max_ticks = (horizon / dt).ceil() as u64;

            for _ in 0..max_ticks {
                if game.is_finished() {
                    break;
                }
                self.step(game, dt);
            }
        } else {
            tracing::warn!("[AutoPlayer] Refusing to run with frame time {}", dt);
        }

        if !game.is_finished() {
            tracing::warn!(
                "[AutoPlayer] Session still {:?} after {:.1}s",
                game.state(),
                game.elapsed()
            );
        }
        game.summary()
    }

    fn strike_candidate<'a>(&self, field: &'a Playfield, lane: Lane) -> Option<&'a LiveTarget> {
        field
            .targets()
            .iter()
            .filter(|t| {
                t.lane() == lane
                    && t.judgable
                    && !t.is_resolved()
                    && strike_offset(t.position) >= STRIKE_LEAD
                    && !self.skips(t.event_index)
            })
            .min_by_key(|t| t.event_index)
    }

    fn skips(&self, event_index: usize) -> bool {
        self.miss_every
            .is_some_and(|k| (event_index + 1) % k as usize == 0)
    }
}

fn pose_at(lane: Lane, center: Vec3, motion: Vec3) -> InstrumentPose {
    InstrumentPose {
        lane,
        center,
        tip: center + Vec3::Y * 0.3,
        base: center - Vec3::Y * 0.3,
        motion,
    }
}
