use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context};
use chart_schema::{Difficulty, Instrument, DEFAULT_BPM, DEFAULT_RESOLUTION};
use fret_mapper::MapperConfig;
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "chart.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    #[serde(flatten)]
    pub mapper: MapperConfig,
    /// Used when the performance carries no tempo.
    pub default_bpm: f64,
    pub min_sustain_beats: f64,
    pub chart_defaults: ChartDefaults,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            mapper: MapperConfig::default(),
            default_bpm: DEFAULT_BPM,
            min_sustain_beats: 0.5,
            chart_defaults: ChartDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartDefaults {
    pub resolution: u32,
    pub difficulty: String,
    pub charter: String,
    /// Track suffix, e.g. `Single` or `DoubleBass`.
    pub instrument: String,
}

impl Default for ChartDefaults {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            difficulty: "Expert".to_string(),
            charter: "Auto-Generated".to_string(),
            instrument: "Single".to_string(),
        }
    }
}

impl ConverterConfig {
    pub fn from_yaml(src: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(src).context("invalid config yaml")?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise `chart.yaml` in the working
    /// directory is used when present, and built-in defaults when not.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let src = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config =
            Self::from_yaml(&src).with_context(|| format!("bad config: {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.mapper.phrase_silence_beats > 0.0,
            "phrase_silence_beats must be > 0 (got {})",
            self.mapper.phrase_silence_beats
        );
        ensure!(
            self.mapper.max_lane_jump <= 4,
            "max_lane_jump must be <= 4 (got {})",
            self.mapper.max_lane_jump
        );
        ensure!(
            self.default_bpm > 0.0,
            "default_bpm must be > 0 (got {})",
            self.default_bpm
        );
        ensure!(
            self.min_sustain_beats >= 0.0,
            "min_sustain_beats must be >= 0 (got {})",
            self.min_sustain_beats
        );
        ensure!(
            self.chart_defaults.resolution > 0,
            "chart_defaults.resolution must be > 0"
        );
        self.difficulty()?;
        self.instrument()?;
        Ok(())
    }

    pub fn difficulty(&self) -> anyhow::Result<Difficulty> {
        let name = &self.chart_defaults.difficulty;
        Difficulty::from_name(name).with_context(|| format!("unknown difficulty: {name}"))
    }

    pub fn instrument(&self) -> anyhow::Result<Instrument> {
        let suffix = &self.chart_defaults.instrument;
        Instrument::from_suffix(suffix).with_context(|| format!("unknown instrument: {suffix}"))
    }
}
