// Chart module - target vocabulary and difficulty-driven chart generation
//
// A chart is the ordered list of targets a player must strike. Each target
// has a time, a color (which also fixes its lane) and an optional required
// swing direction.

pub mod generator;
pub mod motifs;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use generator::ChartGenerator;

/// Target color; each color belongs to exactly one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    pub fn lane(self) -> Lane {
        match self {
            Color::Red => Lane::Left,
            Color::Blue => Lane::Right,
        }
    }
}

/// Horizontal lane; also identifies the input instrument bound to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::Left, Lane::Right];

    pub fn color(self) -> Color {
        match self {
            Lane::Left => Color::Red,
            Lane::Right => Color::Blue,
        }
    }

    /// Dense index for per-lane arrays
    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Right => 1,
        }
    }
}

/// Required swing direction of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

/// Diagonal component of the direction vectors
const DIAGONAL: f32 = 0.7;

impl Direction {
    /// Screen-plane vector of the direction, `None` for `Direction::None`
    pub fn vector(self) -> Option<Vec2> {
        match self {
            Direction::None => None,
            Direction::Up => Some(Vec2::new(0.0, 1.0)),
            Direction::Down => Some(Vec2::new(0.0, -1.0)),
            Direction::Left => Some(Vec2::new(-1.0, 0.0)),
            Direction::Right => Some(Vec2::new(1.0, 0.0)),
            Direction::UpLeft => Some(Vec2::new(-DIAGONAL, DIAGONAL)),
            Direction::UpRight => Some(Vec2::new(DIAGONAL, DIAGONAL)),
            Direction::DownLeft => Some(Vec2::new(-DIAGONAL, -DIAGONAL)),
            Direction::DownRight => Some(Vec2::new(DIAGONAL, -DIAGONAL)),
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }
}

/// Difficulty tier
///
/// Selects chart density and motifs, and the judgment rules applied at play
/// time (direction enforcement, hit cooldown, spatial suppression, speed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Beginner,
    Normal,
    Expert,
    ExpertPlus,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Normal,
        Difficulty::Expert,
        Difficulty::ExpertPlus,
    ];

    /// Beats between the starts of consecutive motif blocks
    pub fn stride(self) -> usize {
        match self {
            Difficulty::Beginner => 16,
            Difficulty::Normal | Difficulty::Expert => 8,
            Difficulty::ExpertPlus => 6,
        }
    }

    /// Whether swing direction is judged
    pub fn enforces_direction(self) -> bool {
        matches!(self, Difficulty::Expert | Difficulty::ExpertPlus)
    }

    /// Multiplier on the base target travel speed
    pub fn speed_multiplier(self) -> f32 {
        match self {
            Difficulty::Beginner => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Expert => 1.3,
            Difficulty::ExpertPlus => 1.5,
        }
    }

    /// Minimum session time between two accepted hits, in seconds
    pub fn hit_cooldown(self) -> f64 {
        match self {
            Difficulty::Beginner => 0.05,
            _ => 0.15,
        }
    }

    /// Whether hits close to the previously hit target are suppressed
    pub fn spatial_suppression(self) -> bool {
        !matches!(self, Difficulty::Beginner)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Normal => "normal",
            Difficulty::Expert => "expert",
            Difficulty::ExpertPlus => "expertPlus",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "normal" => Ok(Difficulty::Normal),
            "expert" => Ok(Difficulty::Expert),
            "expertplus" => Ok(Difficulty::ExpertPlus),
            other => Err(format!(
                "unknown difficulty '{}' (expected beginner, normal, expert or expertPlus)",
                other
            )),
        }
    }
}

/// One chart entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    /// Time at which the target is released onto the playfield, in seconds
    pub time: f64,
    pub color: Color,
    pub direction: Direction,
}

impl TargetEvent {
    pub fn lane(&self) -> Lane {
        self.color.lane()
    }
}

/// Ordered target events for one track and difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub difficulty: Difficulty,
    pub bpm: f64,
    pub seed: u64,
    /// Non-decreasing by time; ties keep generation order
    pub events: Vec<TargetEvent>,
}

impl Chart {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last event, 0 for an empty chart
    pub fn last_event_time(&self) -> f64 {
        self.events.last().map_or(0.0, |event| event.time)
    }

    pub fn is_sorted(&self) -> bool {
        self.events.windows(2).all(|pair| pair[0].time <= pair[1].time)
    }
}
