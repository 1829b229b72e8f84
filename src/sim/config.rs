use std::env;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::control::FollowGains;
use crate::infra::Vec3;
use crate::learning::{BufferConfig, CorrectorConfig, OutputEncoding};

/// Box heights of the default five-high stack, base first.
pub const DEFAULT_HEIGHTS: [f32; 5] = [2.0, 1.5, 1.0, 0.8, 0.5];

#[derive(Debug)]
pub enum ConfigError {
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    Empty {
        key: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value, reason } => {
                write!(formatter, "invalid {} '{}': {}", key, value, reason)
            }
            ConfigError::Empty { key } => write!(formatter, "{} must not be empty", key),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Agent heights, base first. Chain length is the number of entries.
    pub heights: Vec<f32>,
    /// Radius of the base's circle
    pub radius: f32,
    /// Clock advance per tick
    pub time_step: f32,
    /// Wall-clock time between ticks
    pub tick_interval: Duration,
    /// Tick at which correcting starts
    pub correct_after: u64,
    pub gains: FollowGains,
    /// Encodings assigned to followers in turn
    pub encodings: Vec<OutputEncoding>,
    pub buffer: BufferConfig,
    pub corrector: CorrectorConfig,
    /// Stop after this many ticks; run forever when unset
    pub max_ticks: Option<u64>,
    /// Ticks between status lines
    pub status_every: u64,
    /// Folder for the CSV status log
    pub status_folder: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            heights: DEFAULT_HEIGHTS.to_vec(),
            radius: 1.5,
            time_step: 0.01,
            tick_interval: Duration::from_millis(16),
            correct_after: 600,
            gains: FollowGains::default(),
            encodings: vec![OutputEncoding::Signed],
            buffer: BufferConfig::default(),
            corrector: CorrectorConfig::default(),
            max_ticks: None,
            status_every: 60,
            status_folder: None,
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_list<T: FromStr>(key: &'static str, raw: &str) -> Result<Vec<T>, ConfigError>
where
    T::Err: fmt::Display,
{
    let values = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_value(key, part))
        .collect::<Result<Vec<T>, _>>()?;

    if values.is_empty() {
        return Err(ConfigError::Empty { key });
    }
    Ok(values)
}

impl SimConfig {
    /// Defaults overridden by `CUBESTACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("CUBESTACK_HEIGHTS") {
            config.heights = parse_list("CUBESTACK_HEIGHTS", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_RADIUS") {
            config.radius = parse_value("CUBESTACK_RADIUS", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_TIME_STEP") {
            config.time_step = parse_value("CUBESTACK_TIME_STEP", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_TICK_MS") {
            config.tick_interval = Duration::from_millis(parse_value("CUBESTACK_TICK_MS", &raw)?);
        }
        if let Some(raw) = lookup("CUBESTACK_CORRECT_AFTER") {
            config.correct_after = parse_value("CUBESTACK_CORRECT_AFTER", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_ENCODINGS") {
            config.encodings = parse_list("CUBESTACK_ENCODINGS", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_HIDDEN_SIZE") {
            config.corrector.hidden_size = parse_value("CUBESTACK_HIDDEN_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_LEARNING_RATE") {
            config.corrector.learning_rate = parse_value("CUBESTACK_LEARNING_RATE", &raw)?;
        }
        if let Some(raw) = lookup("CUBESTACK_TICKS") {
            config.max_ticks = Some(parse_value("CUBESTACK_TICKS", &raw)?);
        }
        if let Some(raw) = lookup("CUBESTACK_STATUS_EVERY") {
            config.status_every = parse_value("CUBESTACK_STATUS_EVERY", &raw)?;
        }
        config.status_folder = lookup("CUBESTACK_STATUS_FOLDER").filter(|f| !f.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heights.is_empty() {
            return Err(ConfigError::Empty {
                key: "CUBESTACK_HEIGHTS",
            });
        }
        if let Some(bad) = self.heights.iter().find(|h| !h.is_finite() || **h <= 0.0) {
            return Err(ConfigError::Invalid {
                key: "CUBESTACK_HEIGHTS",
                value: bad.to_string(),
                reason: "heights must be positive".to_string(),
            });
        }
        if !self.radius.is_finite() {
            return Err(ConfigError::Invalid {
                key: "CUBESTACK_RADIUS",
                value: self.radius.to_string(),
                reason: "radius must be finite".to_string(),
            });
        }
        if !self.time_step.is_finite() {
            return Err(ConfigError::Invalid {
                key: "CUBESTACK_TIME_STEP",
                value: self.time_step.to_string(),
                reason: "time step must be finite".to_string(),
            });
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "CUBESTACK_TICK_MS",
                value: "0".to_string(),
                reason: "tick interval must be positive".to_string(),
            });
        }
        if self.encodings.is_empty() {
            return Err(ConfigError::Empty {
                key: "CUBESTACK_ENCODINGS",
            });
        }
        if self.corrector.hidden_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CUBESTACK_HIDDEN_SIZE",
                value: "0".to_string(),
                reason: "hidden size must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Encoding for follower `agent` (ids start at 2).
    pub fn encoding_for(&self, agent: usize) -> OutputEncoding {
        let index = agent.saturating_sub(2) % self.encodings.len().max(1);
        self.encodings
            .get(index)
            .copied()
            .unwrap_or(OutputEncoding::Signed)
    }

    /// Starting positions: each agent resting on the one below, base on the ground.
    pub fn stacked_positions(&self) -> Vec<Vec3> {
        let mut top = 0.0;
        self.heights
            .iter()
            .map(|height| {
                let center = top + height / 2.0;
                top = center + height / 2.0;
                Vec3::new(0.0, center, 0.0)
            })
            .collect()
    }
}
