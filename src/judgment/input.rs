// Player input - discrete lane edges and continuous instrument poses
//
// Input devices may live on their own thread. They hand edges to the game
// tick through a bounded wait-free SPSC queue (rtrb) so the tick never
// blocks on a lock.

use glam::Vec3;
use rtrb::{Consumer, Producer};
use serde::{Deserialize, Serialize};

use crate::chart::Lane;

/// Key edge; only `Pressed` can produce a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Edge {
    Pressed,
    Released,
}

/// Discrete hit intent for one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitIntent {
    pub lane: Lane,
    pub edge: Edge,
}

impl HitIntent {
    pub fn pressed(lane: Lane) -> Self {
        Self {
            lane,
            edge: Edge::Pressed,
        }
    }

    pub fn released(lane: Lane) -> Self {
        Self {
            lane,
            edge: Edge::Released,
        }
    }
}

/// Sampled pose of a striking instrument bound to one lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPose {
    pub lane: Lane,
    pub center: Vec3,
    pub tip: Vec3,
    pub base: Vec3,
    /// Displacement of the tip since the previous sample
    pub motion: Vec3,
}

impl InstrumentPose {
    /// Smallest distance from `point` to the tip, base or center
    pub fn min_distance(&self, point: Vec3) -> f32 {
        [self.tip, self.base, self.center]
            .iter()
            .map(|p| p.distance(point))
            .fold(f32::INFINITY, f32::min)
    }

    pub fn swing_speed(&self) -> f32 {
        self.motion.length()
    }
}

/// Create a bounded intent queue
///
/// # Arguments
/// * `capacity` - Maximum number of undelivered intents
///
/// # Returns
/// Sender for the input thread and receiver for the game tick
pub fn intent_channel(capacity: usize) -> (IntentSender, IntentReceiver) {
    let (producer, consumer) = rtrb::RingBuffer::new(capacity.max(1));
    (IntentSender { producer }, IntentReceiver { consumer })
}

/// Producer half of the intent queue
pub struct IntentSender {
    producer: Producer<HitIntent>,
}

impl IntentSender {
    /// Queue an intent without blocking
    ///
    /// # Returns
    /// * `Ok(())` - Queued
    /// * `Err(HitIntent)` - Queue full; the intent is handed back
    pub fn send(&mut self, intent: HitIntent) -> Result<(), HitIntent> {
        self.producer.push(intent).map_err(|_| intent)
    }
}

/// Consumer half of the intent queue
pub struct IntentReceiver {
    consumer: Consumer<HitIntent>,
}

impl IntentReceiver {
    /// Take every queued intent in arrival order
    pub fn drain(&mut self) -> Vec<HitIntent> {
        let mut intents = Vec::with_capacity(self.consumer.slots());
        while let Ok(intent) = self.consumer.pop() {
            intents.push(intent);
        }
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_channel_preserves_order() {
        let (mut tx, mut rx) = intent_channel(8);
        tx.send(HitIntent::pressed(Lane::Left)).unwrap();
        tx.send(HitIntent::released(Lane::Left)).unwrap();
        tx.send(HitIntent::pressed(Lane::Right)).unwrap();

        let intents = rx.drain();
        assert_eq!(
            intents,
            vec![
                HitIntent::pressed(Lane::Left),
                HitIntent::released(Lane::Left),
                HitIntent::pressed(Lane::Right),
            ]
        );
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_full_queue_returns_intent() {
        let (mut tx, _rx) = intent_channel(1);
        tx.send(HitIntent::pressed(Lane::Left)).unwrap();
        let rejected = tx.send(HitIntent::pressed(Lane::Right));
        assert_eq!(rejected, Err(HitIntent::pressed(Lane::Right)));
    }

    #[test]
    fn test_intents_cross_threads() {
        let (mut tx, mut rx) = intent_channel(64);
        let handle = std::thread::spawn(move || {
            for _ in 0..10 {
                tx.send(HitIntent::pressed(Lane::Right)).unwrap();
            }
        });
        handle.join().unwrap();
        assert_eq!(rx.drain().len(), 10);
    }

    #[test]
    fn test_pose_min_distance() {
        let pose = InstrumentPose {
            lane: Lane::Left,
            center: Vec3::new(0.0, 0.0, 0.0),
            tip: Vec3::new(0.0, 1.0, 0.0),
            base: Vec3::new(0.0, -1.0, 0.0),
            motion: Vec3::new(0.3, 0.4, 0.0),
        };
        assert_eq!(pose.min_distance(Vec3::new(0.0, 1.5, 0.0)), 0.5);
        assert!((pose.swing_speed() - 0.5).abs() < 1e-6);
    }
}
