// End-to-end checks from synthesized audio to a finished session

use cube_rhythm::analysis::{analyze_async, AnalysisPipeline, GridSource};
use cube_rhythm::audio::{read_wav, write_wav, ClickTrack};
use cube_rhythm::chart::{ChartGenerator, Difficulty};
use cube_rhythm::game::{AutoPlayMode, AutoPlayer, GameSession};
use cube_rhythm::judgment::Rank;
use cube_rhythm::playback::SchedulerState;

const SAMPLE_RATE: u32 = 44_100;

#[test]
fn test_click_track_to_full_combo() {
    let buffer = ClickTrack::new(120.0, 20.0)
        .with_offset(1.0)
        .render(SAMPLE_RATE)
        .unwrap();
    let report = AnalysisPipeline::new().analyze(&buffer).unwrap();

    assert_eq!(report.bpm, 120.0);
    assert_eq!(report.grid.source, GridSource::OnsetAligned);
    assert!(!report.degraded);

    let chart = ChartGenerator::new().generate(&report.grid, Difficulty::Normal);
    let total = chart.len() as u32;
    assert!(total > 0);

    let mut game = GameSession::new(chart).unwrap();
    game.start().unwrap();
    let summary = AutoPlayer::new(AutoPlayMode::Keys).run(&mut game, 1.0 / 60.0);

    assert_eq!(game.state(), SchedulerState::Complete);
    assert_eq!(summary.hits, total);
    assert_eq!(summary.misses, 0);
    assert_eq!(summary.accuracy_percent, 100);
}

#[test]
fn test_wav_roundtrip_keeps_tempo() {
    let path = std::env::temp_dir().join(format!(
        "cube_rhythm_pipeline_{}.wav",
        std::process::id()
    ));
    let buffer = ClickTrack::new(120.0, 15.0)
        .with_offset(1.0)
        .render(SAMPLE_RATE)
        .unwrap();
    write_wav(&path, &buffer).unwrap();

    let decoded = read_wav(&path).unwrap();
    let report = AnalysisPipeline::new().analyze(&decoded).unwrap();
    assert_eq!(report.bpm, 120.0);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_every_tier_generates_playable_chart() {
    let report = AnalysisPipeline::new().without_audio().unwrap();
    assert!(report.degraded);

    for difficulty in Difficulty::ALL {
        let chart = ChartGenerator::with_seed(3).generate(&report.grid, difficulty);
        assert!(chart.is_sorted(), "{}", difficulty);
        assert!(GameSession::new(chart).is_ok());
    }
}

#[test]
fn test_half_played_session_ranks_low() {
    let report = AnalysisPipeline::new().without_audio().unwrap();
    let chart = ChartGenerator::new().generate(&report.grid, Difficulty::Expert);

    let mut game = GameSession::new(chart).unwrap();
    game.start().unwrap();
    let summary = AutoPlayer::new(AutoPlayMode::Instruments)
        .with_miss_every(2)
        .run(&mut game, 1.0 / 60.0);

    assert!(game.is_finished());
    assert!(summary.misses > 0);
    assert_eq!(summary.rank, Rank::D);
}

#[tokio::test]
async fn test_async_analysis_feeds_chart() {
    let buffer = ClickTrack::new(100.0, 15.0)
        .with_offset(1.0)
        .render(SAMPLE_RATE)
        .unwrap();
    let report = analyze_async(AnalysisPipeline::new(), buffer).await.unwrap();
    assert_eq!(report.bpm, 100.0);

    let chart = ChartGenerator::new().generate(&report.grid, Difficulty::Beginner);
    assert!(chart.events.iter().all(|e| e.time < report.duration));
}
