//! Configuration management for analysis and chart tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration on detection thresholds and tempo heuristics
//! without recompilation. Judgment windows and cooldowns are fixed game
//! rules and are intentionally absent here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Seed used for chart motif shuffling when none is supplied
pub const DEFAULT_CHART_SEED: u64 = 0x5EED_CAFE;

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub filter: FilterConfig,
    pub onset: OnsetConfig,
    pub tempo: TempoConfig,
    pub beat_grid: BeatGridConfig,
    pub chart: ChartConfig,
}

/// Low-pass pre-filter applied before onset analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Skip the filter entirely (raw waveform goes to the onset analyzer)
    pub enabled: bool,
    /// Cutoff frequency in Hz
    pub cutoff_hz: f32,
    /// Resonance
    pub q: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Isolates kick drum / bass energy
            cutoff_hz: 150.0,
            q: 1.0,
        }
    }
}

/// Energy-based onset detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetConfig {
    /// Analysis window size in samples
    pub window_size: usize,
    /// Hop size between consecutive windows
    pub hop_size: usize,
    /// Number of preceding window energies forming the local baseline
    pub history_len: usize,
    /// Energy must exceed `threshold_ratio * mean(history)`
    pub threshold_ratio: f32,
    /// Energy must exceed `mean + stddev_factor * stddev(history)`
    pub stddev_factor: f32,
    /// Minimum spacing between onsets in seconds (strictly greater)
    pub min_spacing_secs: f64,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 512,
            history_len: 43,
            threshold_ratio: 1.3,
            stddev_factor: 1.0,
            min_spacing_secs: 0.1,
        }
    }
}

/// Tempo estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Fewer onsets than this yields `InsufficientOnsets`
    pub min_onsets: usize,
    /// Fraction of intervals trimmed from each tail before taking the median
    pub trim_fraction: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Tempo kept when estimation fails or audio is missing
    pub default_bpm: f64,
    /// Maximum distance in BPM for snapping to a common tempo
    pub anchor_tolerance: f64,
    /// Common musical tempi used as snapping anchors
    pub anchors: Vec<f64>,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            min_onsets: 10,
            trim_fraction: 0.1,
            min_bpm: 60.0,
            max_bpm: 200.0,
            default_bpm: 120.0,
            anchor_tolerance: 3.0,
            anchors: vec![
                60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 128.0, 140.0, 150.0, 160.0, 170.0,
                174.0, 180.0,
            ],
        }
    }
}

/// Beat grid construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatGridConfig {
    /// Maximum distance in seconds for an onset to replace a grid point
    pub match_window_secs: f64,
    /// Track duration used when no audio is available
    pub default_duration_secs: f64,
}

impl Default for BeatGridConfig {
    fn default() -> Self {
        Self {
            match_window_secs: 0.1,
            default_duration_secs: 100.0,
        }
    }
}

/// Chart generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Seed for the high-tier motif shuffle
    pub seed: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_CHART_SEED,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or the defaults if the file is missing or the
    /// JSON is invalid (a warning is logged in both cases)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.onset.window_size, 1024);
        assert_eq!(config.onset.hop_size, 512);
        assert_eq!(config.onset.history_len, 43);
        assert_eq!(config.tempo.min_onsets, 10);
        assert_eq!(config.tempo.default_bpm, 120.0);
        assert_eq!(config.beat_grid.default_duration_secs, 100.0);
        assert_eq!(config.chart.seed, DEFAULT_CHART_SEED);
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "onset": { "hop_size": 256 }, "chart": { "seed": 7 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.onset.hop_size, 256);
        assert_eq!(config.onset.window_size, 1024);
        assert_eq!(config.chart.seed, 7);
        assert_eq!(config.tempo, TempoConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = EngineConfig::load_from_file("/nonexistent/cube_rhythm_config.json");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_json_uses_defaults() {
        let path = std::env::temp_dir().join(format!(
            "cube_rhythm_bad_config_{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();

        let config = EngineConfig::load_from_file(&path);
        assert_eq!(config, EngineConfig::default());

        let _ = fs::remove_file(&path);
    }
}
