// Cube Rhythm Core - Rhythm Game Engine
// Offline beat detection and chart generation, real-time target scheduling
// and hit judgment

// Module declarations
pub mod analysis;
pub mod audio;
pub mod chart;
pub mod config;
pub mod error;
pub mod game;
pub mod judgment;
pub mod playback;

// Re-exports for convenience
pub use analysis::{analyze_async, AnalysisPipeline, AnalysisReport, BeatGrid};
pub use audio::SampleBuffer;
pub use chart::{Chart, ChartGenerator, Difficulty, TargetEvent};
pub use config::EngineConfig;
pub use error::{AnalysisError, ErrorCode, PlaybackError};
pub use game::{AutoPlayMode, AutoPlayer, GameSession, TickReport};
pub use judgment::{HitIntent, InstrumentPose, Outcome, SessionSummary};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_audio_to_finished_session() {
        let report = AnalysisPipeline::new().without_audio().unwrap();
        let chart = ChartGenerator::new().generate(&report.grid, Difficulty::Beginner);
        assert!(!chart.is_empty());

        let mut game = GameSession::new(chart).unwrap();
        game.start().unwrap();
        let summary = AutoPlayer::new(AutoPlayMode::Keys).run(&mut game, 1.0 / 60.0);

        assert!(game.is_finished());
        assert_eq!(summary.misses, 0);
        assert_eq!(summary.accuracy_percent, 100);
    }
}
