// ChartGenerator - procedural charts from a beat grid
//
// The generator walks the beat grid at the tier's stride. Each block picks
// the next motif from the tier's table and places its notes at
// `grid[block_start + offset]`. Lower tiers rotate through motifs in order;
// expertPlus draws a seeded shuffle of the whole table per cycle, so charts
// stay varied but reproducible for a given seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::motifs::{self, Motif};
use super::{Chart, Difficulty, Direction, TargetEvent};
use crate::analysis::BeatGrid;
use crate::config::DEFAULT_CHART_SEED;

/// Deterministic chart generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartGenerator {
    seed: u64,
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::with_seed(DEFAULT_CHART_SEED)
    }
}

impl ChartGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a chart for one difficulty
    ///
    /// # Arguments
    /// * `grid` - Beat grid to place notes on
    /// * `difficulty` - Tier selecting stride, motifs and directions
    ///
    /// # Returns
    /// Chart whose events are non-decreasing in time. Identical inputs and
    /// seed always produce an identical chart.
    pub fn generate(&self, grid: &BeatGrid, difficulty: Difficulty) -> Chart {
        let beats = &grid.beats;
        let table = motifs::motifs(difficulty);
        let mut order = MotifOrder::new(difficulty, table.len(), self.seed);
        let keep_directions = difficulty.enforces_direction();

        let mut events = Vec::new();
        for block_start in (0..beats.len()).step_by(difficulty.stride()) {
            let motif: Motif = table[order.next_index()];
            for note in motif {
                let Some(&time) = beats.get(block_start + note.offset) else {
                    continue;
                };
                events.push(TargetEvent {
                    time,
                    color: note.color,
                    direction: if keep_directions {
                        note.direction
                    } else {
                        Direction::None
                    },
                });
            }
        }

        // Stable, so simultaneous notes keep motif order
        events.sort_by(|a, b| a.time.total_cmp(&b.time));

        tracing::info!(
            "[ChartGenerator] {} chart: {} events over {} beats (seed {})",
            difficulty,
            events.len(),
            beats.len(),
            self.seed
        );

        Chart {
            difficulty,
            bpm: grid.bpm,
            seed: self.seed,
            events,
        }
    }
}

/// Motif selection policy for a tier
enum MotifOrder {
    RoundRobin {
        next: usize,
        len: usize,
    },
    Shuffled {
        rng: StdRng,
        order: Vec<usize>,
        position: usize,
    },
}

impl MotifOrder {
    fn new(difficulty: Difficulty, len: usize, seed: u64) -> Self {
        match difficulty {
            Difficulty::ExpertPlus => MotifOrder::Shuffled {
                rng: StdRng::seed_from_u64(seed),
                order: (0..len).collect(),
                // Forces a shuffle before the first draw
                position: len,
            },
            _ => MotifOrder::RoundRobin { next: 0, len },
        }
    }

    fn next_index(&mut self) -> usize {
        match self {
            MotifOrder::RoundRobin { next, len } => {
                let index = *next;
                *next = (*next + 1) % *len;
                index
            }
            MotifOrder::Shuffled {
                rng,
                order,
                position,
            } => {
                if *position >= order.len() {
                    order.shuffle(rng);
                    *position = 0;
                }
                let index = order[*position];
                *position += 1;
                index
            }
        }
    }
}
