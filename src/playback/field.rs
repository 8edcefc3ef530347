// Playfield - live target geometry
//
// Targets spawn far down the track and travel toward the player along +z.
// The strike line sits at z = 2. A target is judgable while its signed
// offset `z - STRIKE_Z` lies in the open interval (-3, 1); once the offset
// reaches the upper bound it has passed the player.

use glam::Vec3;

use super::arena::{LiveTarget, TargetArena, TargetId};
use crate::chart::{Difficulty, Lane, TargetEvent};

/// Depth at which released targets appear
pub const SPAWN_Z: f32 = -20.0;

/// Depth of the ideal judgment point
pub const STRIKE_Z: f32 = 2.0;

/// Height of every target
pub const TARGET_Y: f32 = 1.5;

/// Horizontal distance of each lane from the center
pub const LANE_OFFSET_X: f32 = 2.0;

/// Travel speed at speed multiplier 1.0, in units per second
pub const BASE_SPEED: f32 = 5.0;

/// Exclusive lower bound of the judgable offset (approaching)
pub const WINDOW_EARLY: f32 = -3.0;

/// Exclusive upper bound of the judgable offset (passed the player)
pub const WINDOW_LATE: f32 = 1.0;

/// Spawn position of a target in a lane
pub fn spawn_position(lane: Lane) -> Vec3 {
    let x = match lane {
        Lane::Left => -LANE_OFFSET_X,
        Lane::Right => LANE_OFFSET_X,
    };
    Vec3::new(x, TARGET_Y, SPAWN_Z)
}

/// Signed distance past the strike line; negative while approaching
pub fn strike_offset(position: Vec3) -> f32 {
    position.z - STRIKE_Z
}

pub fn is_judgable_offset(offset: f32) -> bool {
    offset > WINDOW_EARLY && offset < WINDOW_LATE
}

/// All live targets plus the travel rules for the current difficulty
#[derive(Debug, Clone)]
pub struct Playfield {
    targets: TargetArena,
    speed: f32,
}

impl Playfield {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            targets: TargetArena::new(),
            speed: BASE_SPEED * difficulty.speed_multiplier(),
        }
    }

    /// Travel speed in units per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Seconds a target needs from spawn to the strike line
    pub fn travel_time(&self) -> f64 {
        ((STRIKE_Z - SPAWN_Z) / self.speed) as f64
    }

    /// Place a released chart event at the spawn depth of its lane
    pub fn spawn(&mut self, event: TargetEvent, event_index: usize) -> TargetId {
        self.targets
            .insert(event, event_index, spawn_position(event.lane()))
    }

    /// Move every unresolved target forward and refresh its judgable flag
    pub fn advance(&mut self, dt: f64) {
        let distance = self.speed * dt as f32;
        for target in self.targets.iter_mut().filter(|t| !t.is_resolved()) {
            target.position.z += distance;
            target.judgable = is_judgable_offset(strike_offset(target.position));
        }
    }

    pub fn get(&self, id: TargetId) -> Option<&LiveTarget> {
        self.targets.get(id)
    }

    pub fn targets(&self) -> &TargetArena {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetArena {
        &mut self.targets
    }

    pub fn unresolved_count(&self) -> usize {
        self.targets.unresolved_count()
    }

    /// Drop resolved targets from the field
    pub fn remove_resolved(&mut self) -> Vec<LiveTarget> {
        self.targets.remove_resolved()
    }

    /// Discard every live target without judging it
    pub fn clear(&mut self) {
        self.targets.clear();
    }
}
