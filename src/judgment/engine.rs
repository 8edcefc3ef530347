// JudgmentEngine - hit/miss resolution for live targets
//
// Two input models share the same scoring path:
//
// Model A (lane keys): on a press edge, among unresolved judgable targets of
// the pressed lane pick the one closest to the strike line. The hit is
// rejected while the global cooldown runs, or (above beginner) when the
// candidate sits within SUPPRESSION_RADIUS of where the previously hit
// target would be now. Held keys do not re-trigger until released.
//
// Model B (instruments): every tick each instrument takes the nearest
// unresolved same-lane target within HIT_RADIUS of its tip, base or center,
// provided it is actually swinging. At direction-enforcing tiers a swing
// against the required direction consumes the target as a DirectionFail.
//
// Targets whose offset reaches WINDOW_LATE unresolved are swept as misses.

use glam::Vec3;

use super::input::{Edge, HitIntent, InstrumentPose};
use super::session::SessionState;
use super::{Outcome, Resolution};
use crate::chart::{Difficulty, Direction};
use crate::playback::field::{strike_offset, WINDOW_LATE};
use crate::playback::{Playfield, TargetId};

/// Maximum instrument-to-target distance for a strike
pub const HIT_RADIUS: f32 = 1.0;

/// Minimum instrument motion per sample that counts as a swing
pub const MIN_SWING_SPEED: f32 = 0.01;

/// Planar motion shorter than this is too small to judge direction
pub const MIN_DIRECTION_MOTION: f32 = 0.1;

/// Cosine similarity a swing must exceed to match the required direction
pub const DIRECTION_THRESHOLD: f32 = 0.5;

/// Distance from the last hit target inside which key hits are suppressed
pub const SUPPRESSION_RADIUS: f32 = 1.5;

#[derive(Debug, Clone, Copy)]
struct LastHit {
    time: f64,
    position: Vec3,
}

/// Judgment state for one session
#[derive(Debug, Clone)]
pub struct JudgmentEngine {
    difficulty: Difficulty,
    /// Target travel speed, used to project the last hit forward
    speed: f32,
    held: [bool; 2],
    last_hit: Option<LastHit>,
    instrument_last_hit: [Option<f64>; 2],
}

impl JudgmentEngine {
    pub fn new(difficulty: Difficulty, speed: f32) -> Self {
        Self {
            difficulty,
            speed,
            held: [false; 2],
            last_hit: None,
            instrument_last_hit: [None; 2],
        }
    }

    /// Engine matching a playfield's travel speed
    pub fn for_field(difficulty: Difficulty, field: &Playfield) -> Self {
        Self::new(difficulty, field.speed())
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Forget held keys (e.g. after a pause swallowed release edges)
    pub fn release_all(&mut self) {
        self.held = [false; 2];
    }

    /// Clear held keys and cooldowns for a restart
    pub fn reset(&mut self) {
        self.release_all();
        self.last_hit = None;
        self.instrument_last_hit = [None; 2];
    }

    /// Judge one key edge (model A)
    ///
    /// # Arguments
    /// * `intent` - Lane and edge
    /// * `now` - Session clock in seconds
    /// * `field` - Live targets
    /// * `session` - Score state to update
    ///
    /// # Returns
    /// The single target resolved by this edge, if any
    pub fn on_intent(
        &mut self,
        intent: HitIntent,
        now: f64,
        field: &mut Playfield,
        session: &mut SessionState,
    ) -> Option<Resolution> {
        let held = &mut self.held[intent.lane.index()];
        match intent.edge {
            Edge::Released => {
                *held = false;
                return None;
            }
            Edge::Pressed if *held => {
                tracing::trace!("[Judgment] Ignoring repeated press on {:?}", intent.lane);
                return None;
            }
            Edge::Pressed => *held = true,
        }

        let candidate = field
            .targets()
            .iter()
            .filter(|t| !t.is_resolved() && t.judgable && t.lane() == intent.lane)
            .min_by(|a, b| {
                let offset_a = strike_offset(a.position).abs();
                let offset_b = strike_offset(b.position).abs();
                offset_a
                    .total_cmp(&offset_b)
                    .then(a.event_index.cmp(&b.event_index))
            })
            .map(|t| (t.id, t.position, t.lane()));

        let Some((id, position, lane)) = candidate else {
            tracing::debug!(
                "[Judgment] Press on {:?} at {:.3}s with no judgable target",
                intent.lane,
                now
            );
            return None;
        };

        if let Some(last) = self.last_hit {
            let since = now - last.time;
            if since < self.difficulty.hit_cooldown() {
                tracing::debug!(
                    "[Judgment] Press on {:?} rejected: cooldown ({:.3}s since last hit)",
                    intent.lane,
                    since
                );
                return None;
            }
            if self.difficulty.spatial_suppression() {
                let projected = last.position + Vec3::Z * (self.speed * since as f32);
                if position.distance(projected) < SUPPRESSION_RADIUS {
                    tracing::debug!(
                        "[Judgment] Press on {:?} rejected: too close to last hit",
                        intent.lane
                    );
                    return None;
                }
            }
        }

        if lane != intent.lane {
            tracing::error!(
                "[Judgment] Refusing to resolve {:?} target from a {:?} press",
                lane,
                intent.lane
            );
            return None;
        }

        let resolution = resolve_target(field, id, Outcome::Hit, now, session)?;
        self.last_hit = Some(LastHit {
            time: now,
            position,
        });
        Some(resolution)
    }

    /// Judge one instrument pose sample (model B)
    ///
    /// # Returns
    /// The target struck by this instrument this tick, if any
    pub fn on_pose(
        &mut self,
        pose: &InstrumentPose,
        now: f64,
        field: &mut Playfield,
        session: &mut SessionState,
    ) -> Option<Resolution> {
        let slot = pose.lane.index();
        if let Some(last) = self.instrument_last_hit[slot] {
            if now - last < self.difficulty.hit_cooldown() {
                return None;
            }
        }
        if pose.swing_speed() <= MIN_SWING_SPEED {
            return None;
        }

        let (id, direction) = field
            .targets()
            .iter()
            .filter(|t| !t.is_resolved() && t.lane() == pose.lane)
            .map(|t| (t, pose.min_distance(t.position)))
            .filter(|&(_, distance)| distance < HIT_RADIUS)
            .min_by(|(a, da), (b, db)| {
                da.total_cmp(db)
                    .then(a.event_index.cmp(&b.event_index))
            })
            .map(|(t, _)| (t.id, t.event.direction))?;

        let outcome = if self.difficulty.enforces_direction()
            && !direction_matches(pose.motion, direction)
        {
            Outcome::DirectionFail
        } else {
            Outcome::Hit
        };

        let resolution = resolve_target(field, id, outcome, now, session)?;
        self.instrument_last_hit[slot] = Some(now);
        if outcome == Outcome::DirectionFail {
            tracing::debug!(
                "[Judgment] {:?} swing missed required direction {:?}",
                pose.lane,
                direction
            );
        }
        Some(resolution)
    }

    /// Resolve every unresolved target that has passed the judgable window
    ///
    /// # Returns
    /// Miss resolutions in chart order
    pub fn sweep_misses(
        &mut self,
        now: f64,
        field: &mut Playfield,
        session: &mut SessionState,
    ) -> Vec<Resolution> {
        let mut expired: Vec<(usize, TargetId)> = field
            .targets()
            .iter()
            .filter(|t| !t.is_resolved() && strike_offset(t.position) >= WINDOW_LATE)
            .map(|t| (t.event_index, t.id))
            .collect();
        expired.sort_unstable_by_key(|&(event_index, _)| event_index);

        expired
            .into_iter()
            .filter_map(|(_, id)| resolve_target(field, id, Outcome::Miss, now, session))
            .collect()
    }
}

/// Mark a target resolved and apply its outcome to the session
///
/// Resolving an already-resolved target is a programming fault: it panics in
/// debug builds and is logged and ignored otherwise.
pub fn resolve_target(
    field: &mut Playfield,
    id: TargetId,
    outcome: Outcome,
    now: f64,
    session: &mut SessionState,
) -> Option<Resolution> {
    let Some(target) = field.targets_mut().get_mut(id) else {
        tracing::warn!("[Judgment] Unknown or stale target {:?}", id);
        return None;
    };

    debug_assert!(
        target.outcome.is_none(),
        "target {:?} resolved twice ({:?} then {:?})",
        id,
        target.outcome,
        outcome
    );
    if let Some(previous) = target.outcome {
        tracing::error!(
            "[Judgment] Target {:?} already resolved as {:?}, ignoring {:?}",
            id,
            previous,
            outcome
        );
        return None;
    }

    target.outcome = Some(outcome);
    target.judgable = false;

    let points = match outcome {
        Outcome::Hit => session.register_hit(),
        Outcome::Miss | Outcome::DirectionFail => {
            session.register_miss();
            0
        }
    };

    Some(Resolution {
        id,
        event_index: target.event_index,
        lane: target.lane(),
        outcome,
        points,
        time: now,
    })
}

/// Whether a swing matches the required direction
///
/// Tiny swings and `Direction::None` always match. Depth motion counts
/// against the match since lane directions lie in the screen plane.
pub fn direction_matches(motion: Vec3, direction: Direction) -> bool {
    if motion.length() < MIN_DIRECTION_MOTION {
        return true;
    }
    match direction.vector() {
        Some(expected) => motion.normalize().dot(expected.extend(0.0)) > DIRECTION_THRESHOLD,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Color, Lane, TargetEvent};
    use crate::playback::field::STRIKE_Z;

    struct Fixture {
        field: Playfield,
        engine: JudgmentEngine,
        session: SessionState,
    }

    impl Fixture {
        fn new(difficulty: Difficulty) -> Self {
            let field = Playfield::new(difficulty);
            let engine = JudgmentEngine::for_field(difficulty, &field);
            Self {
                field,
                engine,
                session: SessionState::new(),
            }
        }

        /// Spawn a target and place it at a given strike offset
        fn place(&mut self, color: Color, direction: Direction, index: usize, offset: f32) -> TargetId {
            let event = TargetEvent {
                time: index as f64,
                color,
                direction,
            };
            let id = self.field.spawn(event, index);
            self.field.targets_mut().get_mut(id).unwrap().position.z = STRIKE_Z + offset;
            // Zero-length advance refreshes judgable flags
            self.field.advance(0.0);
            id
        }

        fn press(&mut self, lane: Lane, now: f64) -> Option<Resolution> {
            let resolution = self.engine.on_intent(
                HitIntent::pressed(lane),
                now,
                &mut self.field,
                &mut self.session,
            );
            self.engine.on_intent(
                HitIntent::released(lane),
                now,
                &mut self.field,
                &mut self.session,
            );
            resolution
        }

        fn swing(&mut self, lane: Lane, at: Vec3, motion: Vec3, now: f64) -> Option<Resolution> {
            let pose = InstrumentPose {
                lane,
                center: at,
                tip: at + Vec3::Y * 0.5,
                base: at - Vec3::Y * 0.5,
                motion,
            };
            self.engine
                .on_pose(&pose, now, &mut self.field, &mut self.session)
        }
    }

    #[test]
    fn test_boundary_press_is_hit() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Red, Direction::None, 0, -2.9);

        let resolution = fx.press(Lane::Left, 10.0).unwrap();
        assert_eq!(resolution.id, id);
        assert_eq!(resolution.outcome, Outcome::Hit);
        assert_eq!(resolution.points, 100);
        assert_eq!(fx.session.score(), 100);
        assert_eq!(fx.session.combo(), 1);
    }

    #[test]
    fn test_exit_without_press_is_miss() {
        let mut fx = Fixture::new(Difficulty::Normal);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        fx.press(Lane::Left, 1.0).unwrap();
        assert_eq!(fx.session.score(), 100);

        fx.place(Color::Blue, Direction::None, 1, 1.0);
        let misses = fx.engine.sweep_misses(2.0, &mut fx.field, &mut fx.session);

        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].outcome, Outcome::Miss);
        assert_eq!(misses[0].points, 0);
        assert_eq!(fx.session.score(), 90);
        assert_eq!(fx.session.combo(), 0);
        assert_eq!(fx.session.misses(), 1);
    }

    #[test]
    fn test_miss_on_empty_score_floors_at_zero() {
        let mut fx = Fixture::new(Difficulty::Expert);
        fx.place(Color::Red, Direction::Up, 0, 1.5);
        fx.engine.sweep_misses(0.0, &mut fx.field, &mut fx.session);
        assert_eq!(fx.session.score(), 0);
    }

    #[test]
    fn test_sweep_leaves_judgable_targets() {
        let mut fx = Fixture::new(Difficulty::Normal);
        fx.place(Color::Red, Direction::None, 0, 0.99);
        fx.place(Color::Blue, Direction::None, 1, -10.0);
        assert!(fx
            .engine
            .sweep_misses(0.0, &mut fx.field, &mut fx.session)
            .is_empty());
    }

    #[test]
    fn test_one_target_per_press() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let near = fx.place(Color::Blue, Direction::None, 0, 0.2);
        let far = fx.place(Color::Blue, Direction::None, 1, -2.0);

        let resolution = fx.press(Lane::Right, 5.0).unwrap();
        assert_eq!(resolution.id, near);
        assert!(!fx.field.get(far).unwrap().is_resolved());
        assert_eq!(fx.field.unresolved_count(), 1);
    }

    #[test]
    fn test_equal_offsets_prefer_earlier_event() {
        let mut fx = Fixture::new(Difficulty::Beginner);
        let later = fx.place(Color::Red, Direction::None, 7, 0.5);
        let earlier = fx.place(Color::Red, Direction::None, 3, -0.5);

        let resolution = fx.press(Lane::Left, 1.0).unwrap();
        assert_eq!(resolution.id, earlier);
        assert!(!fx.field.get(later).unwrap().is_resolved());
    }

    #[test]
    fn test_wrong_lane_never_resolves() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Red, Direction::None, 0, 0.0);

        assert!(fx.press(Lane::Right, 1.0).is_none());
        assert!(!fx.field.get(id).unwrap().is_resolved());
        assert_eq!(fx.session, SessionState::new());
    }

    #[test]
    fn test_target_outside_window_not_hit() {
        let mut fx = Fixture::new(Difficulty::Normal);
        fx.place(Color::Red, Direction::None, 0, -3.0);
        assert!(fx.press(Lane::Left, 1.0).is_none());
    }

    #[test]
    fn test_cooldown_blocks_rapid_hits() {
        let mut fx = Fixture::new(Difficulty::Normal);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        fx.place(Color::Blue, Direction::None, 1, 0.0);

        assert!(fx.press(Lane::Left, 1.0).is_some());
        assert!(fx.press(Lane::Right, 1.1).is_none());
        assert!(fx.press(Lane::Right, 1.2).is_some());
    }

    #[test]
    fn test_beginner_cooldown_is_shorter() {
        let mut fx = Fixture::new(Difficulty::Beginner);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        fx.place(Color::Blue, Direction::None, 1, 0.0);

        assert!(fx.press(Lane::Left, 1.0).is_some());
        assert!(fx.press(Lane::Right, 1.06).is_some());
    }

    #[test]
    fn test_spatial_suppression_near_last_hit() {
        let mut fx = Fixture::new(Difficulty::Normal);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        assert!(fx.press(Lane::Left, 0.0).is_some());

        // Last hit would now be 1 unit past the strike line; this target
        // sits right behind it
        fx.place(Color::Red, Direction::None, 1, 0.0);
        assert!(fx.press(Lane::Left, 0.2).is_none());
    }

    #[test]
    fn test_no_spatial_suppression_at_beginner() {
        let mut fx = Fixture::new(Difficulty::Beginner);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        assert!(fx.press(Lane::Left, 0.0).is_some());

        fx.place(Color::Red, Direction::None, 1, 0.0);
        assert!(fx.press(Lane::Left, 0.2).is_some());
    }

    #[test]
    fn test_held_key_does_not_retrigger() {
        let mut fx = Fixture::new(Difficulty::Normal);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        fx.place(Color::Red, Direction::None, 1, -2.5);

        let press = HitIntent::pressed(Lane::Left);
        assert!(fx
            .engine
            .on_intent(press, 0.0, &mut fx.field, &mut fx.session)
            .is_some());
        // Autorepeat while still held
        assert!(fx
            .engine
            .on_intent(press, 1.0, &mut fx.field, &mut fx.session)
            .is_none());

        fx.engine.on_intent(
            HitIntent::released(Lane::Left),
            1.0,
            &mut fx.field,
            &mut fx.session,
        );
        assert!(fx
            .engine
            .on_intent(press, 1.0, &mut fx.field, &mut fx.session)
            .is_some());
    }

    #[test]
    fn test_swing_hits_nearby_target() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Blue, Direction::None, 0, 0.0);
        let at = fx.field.get(id).unwrap().position;

        let resolution = fx
            .swing(Lane::Right, at + Vec3::X * 0.5, Vec3::new(0.0, -0.3, 0.0), 1.0)
            .unwrap();
        assert_eq!(resolution.outcome, Outcome::Hit);
    }

    #[test]
    fn test_static_touch_is_not_a_hit() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Blue, Direction::None, 0, 0.0);
        let at = fx.field.get(id).unwrap().position;

        assert!(fx.swing(Lane::Right, at, Vec3::ZERO, 1.0).is_none());
        assert!(fx
            .swing(Lane::Right, at, Vec3::new(0.005, 0.0, 0.0), 1.0)
            .is_none());
    }

    #[test]
    fn test_swing_ignores_other_lane_and_far_targets() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let red = fx.place(Color::Red, Direction::None, 0, 0.0);
        let at = fx.field.get(red).unwrap().position;

        assert!(fx.swing(Lane::Right, at, Vec3::Y * -0.5, 1.0).is_none());
        assert!(fx
            .swing(Lane::Left, at + Vec3::Z * 1.6, Vec3::Y * -0.5, 1.0)
            .is_none());
    }

    #[test]
    fn test_wrong_direction_at_expert_is_direction_fail() {
        let mut fx = Fixture::new(Difficulty::Expert);
        fx.place(Color::Red, Direction::None, 0, 0.0);
        fx.press(Lane::Left, 0.0);
        assert_eq!(fx.session.combo(), 1);

        let id = fx.place(Color::Red, Direction::Up, 1, 0.0);
        let at = fx.field.get(id).unwrap().position;
        let resolution = fx
            .swing(Lane::Left, at, Vec3::new(0.0, -0.5, 0.0), 1.0)
            .unwrap();

        assert_eq!(resolution.outcome, Outcome::DirectionFail);
        assert!(fx.field.get(id).unwrap().is_resolved());
        assert_eq!(fx.session.combo(), 0);
        assert_eq!(fx.session.misses(), 1);
        assert_eq!(fx.session.score(), 90);
    }

    #[test]
    fn test_direction_ignored_below_expert() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Red, Direction::Up, 0, 0.0);
        let at = fx.field.get(id).unwrap().position;

        let resolution = fx
            .swing(Lane::Left, at, Vec3::new(0.0, -0.5, 0.0), 1.0)
            .unwrap();
        assert_eq!(resolution.outcome, Outcome::Hit);
    }

    #[test]
    fn test_instrument_cooldown() {
        let mut fx = Fixture::new(Difficulty::ExpertPlus);
        let a = fx.place(Color::Blue, Direction::None, 0, 0.0);
        let b = fx.place(Color::Blue, Direction::None, 1, 0.3);
        let at_a = fx.field.get(a).unwrap().position;
        let at_b = fx.field.get(b).unwrap().position;

        assert!(fx.swing(Lane::Right, at_a, Vec3::Y * 0.3, 1.0).is_some());
        assert!(fx.swing(Lane::Right, at_b, Vec3::Y * 0.3, 1.1).is_none());
        assert!(fx.swing(Lane::Right, at_b, Vec3::Y * 0.3, 1.2).is_some());
    }

    #[test]
    fn test_direction_matches() {
        let up = Direction::Up;
        assert!(direction_matches(Vec3::new(0.0, 0.5, 0.0), up));
        assert!(!direction_matches(Vec3::new(0.0, -0.5, 0.0), up));
        assert!(!direction_matches(Vec3::new(0.5, 0.0, 0.0), up));
        // Too short to judge, depth included
        assert!(direction_matches(Vec3::new(0.0, -0.05, 0.05), up));
        assert!(direction_matches(Vec3::new(0.3, -0.3, 0.0), Direction::None));
        assert!(direction_matches(Vec3::new(0.4, 0.4, 0.0), Direction::UpRight));
        assert!(!direction_matches(Vec3::new(-0.4, 0.4, 0.0), Direction::UpRight));
        // Mostly along z: the upward part alone is not enough
        assert!(!direction_matches(Vec3::new(0.0, 0.3, 1.0), up));
        assert!(direction_matches(Vec3::new(0.0, 0.5, 0.2), up));
    }

    #[test]
    fn test_depth_swing_at_expert_is_direction_fail() {
        let mut fx = Fixture::new(Difficulty::Expert);
        let id = fx.place(Color::Red, Direction::Up, 0, 0.0);
        let at = fx.field.get(id).unwrap().position;

        let resolution = fx
            .swing(Lane::Left, at, Vec3::new(0.0, 0.3, 1.0), 1.0)
            .unwrap();
        assert_eq!(resolution.outcome, Outcome::DirectionFail);
        assert_eq!(fx.session.misses(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "resolved twice")]
    fn test_double_resolution_panics_in_debug() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Red, Direction::None, 0, 0.0);
        resolve_target(&mut fx.field, id, Outcome::Hit, 0.0, &mut fx.session);
        resolve_target(&mut fx.field, id, Outcome::Miss, 0.0, &mut fx.session);
    }

    #[test]
    fn test_stale_id_is_ignored() {
        let mut fx = Fixture::new(Difficulty::Normal);
        let id = fx.place(Color::Red, Direction::None, 0, 0.0);
        fx.field.clear();
        assert!(resolve_target(&mut fx.field, id, Outcome::Hit, 0.0, &mut fx.session).is_none());
        assert_eq!(fx.session.hits(), 0);
    }
}
