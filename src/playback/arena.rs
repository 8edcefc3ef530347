// TargetArena - id-indexed storage for live targets
//
// Slots are reused through a free list. Every slot carries a generation
// counter that is bumped on removal, so a stale `TargetId` never aliases the
// target that later occupies the same slot.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::chart::{Lane, TargetEvent};
use crate::judgment::Outcome;

/// Stable handle to a live target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId {
    index: u32,
    generation: u32,
}

impl TargetId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A released chart event travelling toward the strike line
#[derive(Debug, Clone, PartialEq)]
pub struct LiveTarget {
    pub id: TargetId,
    pub event: TargetEvent,
    /// Position of the event in its chart
    pub event_index: usize,
    pub position: Vec3,
    /// Inside the judgable depth window this tick
    pub judgable: bool,
    /// Set exactly once, when the target is judged
    pub outcome: Option<Outcome>,
}

impl LiveTarget {
    pub fn lane(&self) -> Lane {
        self.event.lane()
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    target: Option<LiveTarget>,
}

/// Slot vector plus free list
#[derive(Debug, Clone, Default)]
pub struct TargetArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl TargetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new unresolved, not yet judgable target
    pub fn insert(&mut self, event: TargetEvent, event_index: usize, position: Vec3) -> TargetId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = TargetId {
            index,
            generation: slot.generation,
        };
        slot.target = Some(LiveTarget {
            id,
            event,
            event_index,
            position,
            judgable: false,
            outcome: None,
        });
        self.len += 1;
        id
    }

    pub fn get(&self, id: TargetId) -> Option<&LiveTarget> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.target.as_ref())
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut LiveTarget> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.target.as_mut())
    }

    /// Remove a target, invalidating its id
    pub fn remove(&mut self, id: TargetId) -> Option<LiveTarget> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let target = slot.target.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(target)
    }

    /// Remove every resolved target, returning them in slot order
    pub fn remove_resolved(&mut self) -> Vec<LiveTarget> {
        let resolved: Vec<TargetId> = self
            .iter()
            .filter(|target| target.is_resolved())
            .map(|target| target.id)
            .collect();

        resolved.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveTarget> {
        self.slots.iter().filter_map(|slot| slot.target.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LiveTarget> {
        self.slots.iter_mut().filter_map(|slot| slot.target.as_mut())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn unresolved_count(&self) -> usize {
        self.iter().filter(|target| !target.is_resolved()).count()
    }

    /// Drop every target; all outstanding ids become stale
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.target.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }
}
