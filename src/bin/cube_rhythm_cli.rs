use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use cube_rhythm::analysis::{analyze_async, AnalysisPipeline, AnalysisReport, SpectrumAnalyzer};
use cube_rhythm::audio::{read_wav, write_wav, ClickTrack};
use cube_rhythm::chart::{Chart, ChartGenerator, Difficulty};
use cube_rhythm::config::EngineConfig;
use cube_rhythm::game::{AutoPlayMode, AutoPlayer, GameSession};
use cube_rhythm::judgment::SessionSummary;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "cube_rhythm_cli",
    about = "Offline analysis, chart generation and autoplay harness for Cube Rhythm"
)]
struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// JSON engine configuration (defaults are used when absent or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a click-track WAV at a fixed tempo
    Synth {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 120.0)]
        bpm: f64,
        /// Track length in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        /// Time of the first click in seconds
        #[arg(long, default_value_t = 0.5)]
        offset: f64,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
    },
    /// Detect onsets, tempo and the beat grid of a WAV file
    Analyze {
        #[arg(long)]
        wav: PathBuf,
    },
    /// Generate a chart for one difficulty
    Chart {
        #[command(flatten)]
        source: AudioSource,
        #[arg(long, default_value = "normal")]
        difficulty: Difficulty,
        /// Motif shuffle seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Byte spectrum of the audio around a point in time
    Spectrum {
        #[arg(long)]
        wav: PathBuf,
        /// Time in seconds the analysis window ends at
        #[arg(long, default_value_t = 0.0)]
        at: f64,
    },
    /// Autoplay a generated chart and report the session result
    Simulate {
        #[command(flatten)]
        source: AudioSource,
        #[arg(long, default_value = "normal")]
        difficulty: Difficulty,
        #[arg(long)]
        seed: Option<u64>,
        /// Let every k-th target pass unplayed (0 plays everything)
        #[arg(long, default_value_t = 0)]
        miss_every: u32,
        #[arg(long, value_enum, default_value_t = InputMode::Keys)]
        mode: InputMode,
        /// Simulated frame rate
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct AudioSource {
    /// Music to analyze
    #[arg(long)]
    wav: Option<PathBuf>,
    /// Play on a uniform grid at the default tempo
    #[arg(long)]
    no_audio: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum InputMode {
    Keys,
    Instruments,
}

impl From<InputMode> for AutoPlayMode {
    fn from(mode: InputMode) -> Self {
        match mode {
            InputMode::Keys => AutoPlayMode::Keys,
            InputMode::Instruments => AutoPlayMode::Instruments,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli
        .config
        .as_deref()
        .map(EngineConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Synth {
            output,
            bpm,
            duration,
            offset,
            sample_rate,
        } => run_synth(&output, bpm, duration, offset, sample_rate),
        Commands::Analyze { wav } => run_analyze(&config, &wav),
        Commands::Chart {
            source,
            difficulty,
            seed,
            output,
        } => run_chart(&config, &source, difficulty, seed, output),
        Commands::Spectrum { wav, at } => run_spectrum(&wav, at),
        Commands::Simulate {
            source,
            difficulty,
            seed,
            miss_every,
            mode,
            fps,
        } => run_simulate(&config, &source, difficulty, seed, miss_every, mode, fps),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn run_synth(
    output: &Path,
    bpm: f64,
    duration: f64,
    offset: f64,
    sample_rate: u32,
) -> Result<ExitCode> {
    let track = ClickTrack::new(bpm, duration).with_offset(offset);
    let buffer = track.render(sample_rate)?;
    write_wav(output, &buffer).with_context(|| format!("writing {}", output.display()))?;

    emit(&SynthPayload {
        output: output.display().to_string(),
        bpm,
        duration,
        sample_rate,
        clicks: track.beat_times().len(),
    })?;
    Ok(ExitCode::SUCCESS)
}

fn run_analyze(config: &EngineConfig, wav: &Path) -> Result<ExitCode> {
    let report = analyze_file(config, wav)?;

    emit(&AnalyzePayload {
        onset_count: report.onsets.len(),
        bpm: report.bpm,
        raw_bpm: report.tempo.map(|tempo| tempo.raw_bpm),
        snapped: report.tempo.is_some_and(|tempo| tempo.snapped),
        source: report.grid.source,
        duration: report.duration,
        beat_count: report.grid.len(),
        beats: &report.grid.beats,
    })?;
    Ok(ExitCode::SUCCESS)
}

fn run_chart(
    config: &EngineConfig,
    source: &AudioSource,
    difficulty: Difficulty,
    seed: Option<u64>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let chart = build_chart(config, source, difficulty, seed)?;
    let json = serde_json::to_string_pretty(&chart)?;

    if let Some(path) = output {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_spectrum(wav: &Path, at: f64) -> Result<ExitCode> {
    let buffer = read_wav(wav).with_context(|| format!("reading {}", wav.display()))?;
    let snapshot = SpectrumAnalyzer::default().snapshot(&buffer, at);
    emit(&snapshot)?;
    Ok(ExitCode::SUCCESS)
}

fn run_simulate(
    config: &EngineConfig,
    source: &AudioSource,
    difficulty: Difficulty,
    seed: Option<u64>,
    miss_every: u32,
    mode: InputMode,
    fps: f64,
) -> Result<ExitCode> {
    if !(fps.is_finite() && fps > 0.0) {
        anyhow::bail!("--fps must be a positive number (got {fps})");
    }

    let chart = build_chart(config, source, difficulty, seed)?;
    let event_count = chart.len();
    let mut game = GameSession::new(chart).context("building game session")?;
    game.start()?;

    let mut player = AutoPlayer::new(mode.into()).with_miss_every(miss_every);
    let summary = player.run(&mut game, 1.0 / fps);

    emit(&SimulatePayload {
        difficulty,
        event_count,
        completed: game.is_finished(),
        summary,
    })?;
    Ok(ExitCode::SUCCESS)
}

fn analyze_file(config: &EngineConfig, wav: &Path) -> Result<AnalysisReport> {
    let buffer = read_wav(wav).with_context(|| format!("reading {}", wav.display()))?;
    let pipeline = AnalysisPipeline::with_config(config.clone());
    let runtime = tokio::runtime::Runtime::new().context("starting analysis runtime")?;
    runtime
        .block_on(analyze_async(pipeline, buffer))
        .with_context(|| format!("analyzing {}", wav.display()))
}

fn build_chart(
    config: &EngineConfig,
    source: &AudioSource,
    difficulty: Difficulty,
    seed: Option<u64>,
) -> Result<Chart> {
    let report = match &source.wav {
        Some(wav) => analyze_file(config, wav)?,
        None => AnalysisPipeline::with_config(config.clone()).without_audio()?,
    };
    let generator = ChartGenerator::with_seed(seed.unwrap_or(config.chart.seed));
    Ok(generator.generate(&report.grid, difficulty))
}

fn emit<T: Serialize>(payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthPayload {
    output: String,
    bpm: f64,
    duration: f64,
    sample_rate: u32,
    clicks: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzePayload<'a> {
    onset_count: usize,
    bpm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_bpm: Option<f64>,
    snapped: bool,
    source: cube_rhythm::analysis::GridSource,
    duration: f64,
    beat_count: usize,
    beats: &'a [f64],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulatePayload {
    difficulty: Difficulty,
    event_count: usize,
    completed: bool,
    summary: SessionSummary,
}
