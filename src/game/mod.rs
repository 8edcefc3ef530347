// GameSession - per-tick orchestration of one play-through
//
// Owns the scheduler, playfield, judgment engine and score state for a
// single chart and drives them in a fixed order every tick:
//
// 1. Release due chart events onto the playfield
// 2. Move live targets and refresh their judgable flags
// 3. Judge queued key edges (model A)
// 4. Judge instrument poses (model B)
// 5. Sweep targets that left the window as misses
// 6. Drop resolved targets
// 7. Check for completion
// 8. Publish the tick report on the HUD channel

pub mod autoplay;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::chart::{Chart, Difficulty};
use crate::error::{log_playback_error, PlaybackError};
use crate::judgment::{
    HitIntent, InstrumentPose, IntentReceiver, JudgmentEngine, Resolution, SessionState,
    SessionSummary,
};
use crate::playback::{PlaybackScheduler, Playfield, SchedulerState, TargetId};

pub use autoplay::{AutoPlayMode, AutoPlayer};

/// HUD channel buffer; slow subscribers lag and skip old reports
pub const HUD_CHANNEL_CAPACITY: usize = 100;

/// Everything that happened during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Session clock after the tick
    pub time: f64,
    pub released: Vec<TargetId>,
    pub resolved: Vec<Resolution>,
    pub score: u64,
    pub combo: u32,
    pub multiplier: u32,
    pub state: SchedulerState,
}

/// One play-through of a chart
pub struct GameSession {
    scheduler: PlaybackScheduler,
    field: Playfield,
    engine: JudgmentEngine,
    session: SessionState,
    pending: Vec<HitIntent>,
    intent_rx: Option<IntentReceiver>,
    hud: broadcast::Sender<TickReport>,
}

impl GameSession {
    /// Create an idle session for a chart
    ///
    /// # Returns
    /// * `Ok(GameSession)` - Ready to start
    /// * `Err(PlaybackError::UnsortedChart)` - Chart events out of time order
    pub fn new(chart: Chart) -> Result<Self, PlaybackError> {
        let difficulty = chart.difficulty;
        let scheduler = PlaybackScheduler::new(chart)?;
        let field = Playfield::new(difficulty);
        let engine = JudgmentEngine::for_field(difficulty, &field);
        let (hud, _) = broadcast::channel(HUD_CHANNEL_CAPACITY);

        Ok(Self {
            scheduler,
            field,
            engine,
            session: SessionState::new(),
            pending: Vec::new(),
            intent_rx: None,
            hud,
        })
    }

    pub fn start(&mut self) -> Result<(), PlaybackError> {
        self.scheduler
            .start()
            .inspect_err(|err| log_playback_error(err, "GameSession::start"))?;
        tracing::info!(
            "[GameSession] Started {} chart with {} events",
            self.difficulty(),
            self.scheduler.chart().len()
        );
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        self.scheduler.pause()
    }

    /// Resume after a pause; keys held across the pause count as released
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        self.scheduler.resume()?;
        self.engine.release_all();
        Ok(())
    }

    /// Cancel the session, discarding live targets without judging them
    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        self.pending.clear();
        self.scheduler.stop(&mut self.field)
    }

    /// Rewind the chart, clear the score and start again
    pub fn restart(&mut self) -> Result<(), PlaybackError> {
        self.scheduler.reset(&mut self.field);
        self.session.reset();
        self.engine.reset();
        self.pending.clear();
        if let Some(rx) = self.intent_rx.as_mut() {
            rx.drain();
        }
        self.start()
    }

    /// Queue a key edge for the next tick
    pub fn push_intent(&mut self, intent: HitIntent) {
        self.pending.push(intent);
    }

    /// Also drain key edges from a cross-thread intent queue every tick
    pub fn attach_intent_receiver(&mut self, receiver: IntentReceiver) {
        self.intent_rx = Some(receiver);
    }

    /// Subscribe to per-tick HUD reports
    pub fn subscribe(&self) -> broadcast::Receiver<TickReport> {
        self.hud.subscribe()
    }

    /// Advance the session by one frame
    ///
    /// # Arguments
    /// * `dt` - Seconds since the previous tick
    /// * `poses` - Current instrument poses (empty when playing with keys)
    ///
    /// # Returns
    /// Report of releases and resolutions this tick. Outside the Running
    /// state nothing advances, queued intents are dropped and the report is
    /// not broadcast.
    pub fn tick(&mut self, dt: f64, poses: &[InstrumentPose]) -> TickReport {
        if self.scheduler.state() != SchedulerState::Running {
            self.pending.clear();
            if let Some(rx) = self.intent_rx.as_mut() {
                rx.drain();
            }
            return self.report(Vec::new(), Vec::new());
        }

        let before = self.scheduler.elapsed();
        let released = self.scheduler.tick(dt, &mut self.field);
        let now = self.scheduler.elapsed();
        self.field.advance(now - before);

        let mut intents = std::mem::take(&mut self.pending);
        if let Some(rx) = self.intent_rx.as_mut() {
            intents.extend(rx.drain());
        }

        let mut resolved = Vec::new();
        for intent in intents {
            resolved.extend(
                self.engine
                    .on_intent(intent, now, &mut self.field, &mut self.session),
            );
        }
        for pose in poses {
            resolved.extend(
                self.engine
                    .on_pose(pose, now, &mut self.field, &mut self.session),
            );
        }
        resolved.extend(
            self.engine
                .sweep_misses(now, &mut self.field, &mut self.session),
        );

        self.field.remove_resolved();
        if self.scheduler.update_completion(&self.field) {
            let summary = self.session.summary();
            tracing::info!(
                "[GameSession] Finished: score {}, accuracy {}%, rank {}",
                summary.score,
                summary.accuracy_percent,
                summary.rank
            );
        }

        let report = self.report(released, resolved);
        // No subscribers is not an error
        let _ = self.hud.send(report.clone());
        report
    }

    /// Final (or running) result of the session
    pub fn summary(&self) -> SessionSummary {
        self.session.summary()
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// True once the chart completed or the session was stopped
    pub fn is_finished(&self) -> bool {
        matches!(
            self.scheduler.state(),
            SchedulerState::Complete | SchedulerState::Stopped
        )
    }

    pub fn elapsed(&self) -> f64 {
        self.scheduler.elapsed()
    }

    pub fn chart(&self) -> &Chart {
        self.scheduler.chart()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.scheduler.chart().difficulty
    }

    pub fn field(&self) -> &Playfield {
        &self.field
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    fn report(&self, released: Vec<TargetId>, resolved: Vec<Resolution>) -> TickReport {
        TickReport {
            time: self.scheduler.elapsed(),
            released,
            resolved,
            score: self.session.score(),
            combo: self.session.combo(),
            multiplier: self.session.multiplier(),
            state: self.scheduler.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Color, Direction, Lane, TargetEvent};
    use crate::judgment::{intent_channel, Outcome};

    fn chart(difficulty: Difficulty, events: &[(f64, Color)]) -> Chart {
        Chart {
            difficulty,
            bpm: 120.0,
            seed: 0,
            events: events
                .iter()
                .map(|&(time, color)| TargetEvent {
                    time,
                    color,
                    direction: Direction::None,
                })
                .collect(),
        }
    }

    fn started(events: &[(f64, Color)]) -> GameSession {
        let mut game = GameSession::new(chart(Difficulty::Normal, events)).unwrap();
        game.start().unwrap();
        game
    }

    #[test]
    fn test_rejects_unsorted_chart() {
        let result = GameSession::new(chart(
            Difficulty::Normal,
            &[(1.0, Color::Red), (0.5, Color::Blue)],
        ));
        assert!(matches!(
            result,
            Err(PlaybackError::UnsortedChart { index: 1 })
        ));
    }

    #[test]
    fn test_press_at_strike_line_hits() {
        let mut game = started(&[(0.0, Color::Red)]);

        let report = game.tick(0.0, &[]);
        assert_eq!(report.released.len(), 1);

        // Normal travel time from spawn to strike line
        game.tick(4.4, &[]);
        game.push_intent(HitIntent::pressed(Lane::Left));
        let report = game.tick(0.0, &[]);

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.resolved[0].outcome, Outcome::Hit);
        assert_eq!(report.score, 100);
        assert_eq!(report.combo, 1);
        assert_eq!(report.state, SchedulerState::Complete);
        assert!(game.is_finished());
    }

    #[test]
    fn test_unplayed_chart_ends_in_misses() {
        let mut game = started(&[(0.0, Color::Red), (0.5, Color::Blue)]);

        let mut misses = 0;
        for _ in 0..600 {
            let report = game.tick(1.0 / 60.0, &[]);
            misses += report
                .resolved
                .iter()
                .filter(|r| r.outcome == Outcome::Miss)
                .count();
            if game.is_finished() {
                break;
            }
        }

        assert_eq!(misses, 2);
        assert_eq!(game.state(), SchedulerState::Complete);
        let summary = game.summary();
        assert_eq!(summary.score, 0);
        assert_eq!(summary.misses, 2);
        assert_eq!(summary.accuracy_percent, 0);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut game = started(&[(1.0, Color::Red)]);
        game.tick(0.5, &[]);
        game.pause().unwrap();

        game.push_intent(HitIntent::pressed(Lane::Left));
        let report = game.tick(10.0, &[]);
        assert!(report.released.is_empty());
        assert_eq!(report.state, SchedulerState::Paused);
        assert_eq!(game.elapsed(), 0.5);

        game.resume().unwrap();
        let report = game.tick(0.5, &[]);
        assert_eq!(report.released.len(), 1);
        // The press queued while paused was dropped
        assert!(report.resolved.is_empty());
    }

    #[test]
    fn test_stop_discards_without_scoring() {
        let mut game = started(&[(0.0, Color::Red), (0.1, Color::Blue)]);
        game.tick(0.2, &[]);
        assert_eq!(game.field().targets().len(), 2);

        game.stop().unwrap();
        assert_eq!(game.state(), SchedulerState::Stopped);
        assert!(game.field().targets().is_empty());
        assert_eq!(game.session(), &SessionState::new());
        assert!(game.stop().is_err());
    }

    #[test]
    fn test_restart_clears_score() {
        let mut game = started(&[(0.0, Color::Red)]);
        game.tick(0.0, &[]);
        game.tick(4.4, &[]);
        game.push_intent(HitIntent::pressed(Lane::Left));
        game.tick(0.0, &[]);
        assert_eq!(game.summary().score, 100);

        game.restart().unwrap();
        assert_eq!(game.state(), SchedulerState::Running);
        assert_eq!(game.elapsed(), 0.0);
        assert_eq!(game.summary().score, 0);
        assert_eq!(game.tick(0.0, &[]).released.len(), 1);
    }

    #[test]
    fn test_intents_from_queue() {
        let mut game = started(&[(0.0, Color::Blue)]);
        let (mut tx, rx) = intent_channel(8);
        game.attach_intent_receiver(rx);

        game.tick(0.0, &[]);
        game.tick(4.4, &[]);
        tx.send(HitIntent::pressed(Lane::Right)).unwrap();
        let report = game.tick(0.0, &[]);

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.resolved[0].lane, Lane::Right);
    }

    #[test]
    fn test_hud_receives_reports() {
        let mut game = started(&[(0.0, Color::Red)]);
        let mut hud = game.subscribe();

        let report = game.tick(0.0, &[]);
        assert_eq!(hud.try_recv().unwrap(), report);
    }

    #[test]
    fn test_idle_ticks_are_not_broadcast() {
        let mut game = GameSession::new(chart(Difficulty::Normal, &[(0.0, Color::Red)])).unwrap();
        let mut hud = game.subscribe();

        let report = game.tick(1.0, &[]);
        assert_eq!(report.state, SchedulerState::Idle);
        assert!(hud.try_recv().is_err());
    }

    #[test]
    fn test_tick_report_json_shape() {
        let mut game = started(&[(0.0, Color::Red)]);
        let report = game.tick(0.0, &[]);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["state"], "running");
        assert_eq!(json["released"].as_array().unwrap().len(), 1);
        assert!(json.get("multiplier").is_some());
    }
}
