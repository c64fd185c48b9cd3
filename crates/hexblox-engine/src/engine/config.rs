use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, core::PieceKind};

use super::piece_factory::PieceSeed;

/// Tunables of one game.
///
/// Every field has a default, so a JSON file only needs the fields it changes:
///
/// ```
/// use hexblox_engine::GameConfig;
///
/// let config = GameConfig::from_json_str(r#"{ "flash_cycles": 5 }"#).unwrap();
/// assert_eq!(config.flash_cycles, 5);
/// assert_eq!(config.flash_interval_ms, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Period of the flash toggle on cleared rows.
    pub flash_interval_ms: u64,
    /// Intervals a cleared row flashes before it is hidden.
    pub flash_cycles: u32,
    pub fall_delay: FallDelay,
    /// Draw unforced pieces from `test_sequence` instead of at random.
    pub test_mode: bool,
    pub test_sequence: Vec<PieceKind>,
    /// Fixed seed; a random one is drawn when absent.
    pub seed: Option<PieceSeed>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            flash_interval_ms: 300,
            flash_cycles: 3,
            fall_delay: FallDelay::default(),
            test_mode: false,
            test_sequence: PieceKind::MOVABLE.to_vec(),
            seed: None,
        }
    }
}

/// Auto-fall delay as a function of level: `max(base - per_level * level, min)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallDelay {
    pub base_ms: u64,
    pub per_level_ms: u64,
    pub min_ms: u64,
}

impl Default for FallDelay {
    fn default() -> Self {
        Self {
            base_ms: 1025,
            per_level_ms: 25,
            min_ms: 100,
        }
    }
}

impl FallDelay {
    /// ```
    /// use std::time::Duration;
    ///
    /// use hexblox_engine::FallDelay;
    ///
    /// let delay = FallDelay::default();
    /// assert_eq!(delay.at_level(1), Duration::from_millis(1000));
    /// assert_eq!(delay.at_level(41), Duration::from_millis(100));
    /// ```
    #[must_use]
    pub fn at_level(&self, level: u32) -> Duration {
        let ms = self
            .base_ms
            .saturating_sub(self.per_level_ms.saturating_mul(u64::from(level)));
        Duration::from_millis(ms.max(self.min_ms))
    }
}

impl GameConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flash_interval_ms == 0 {
            return Err(ConfigError::ZeroFlashInterval);
        }
        if self.flash_cycles == 0 {
            return Err(ConfigError::ZeroFlashCycles);
        }
        if self.fall_delay.min_ms == 0 {
            return Err(ConfigError::ZeroFallDelay);
        }
        if self.test_mode {
            if self.test_sequence.is_empty() {
                return Err(ConfigError::EmptyTestSequence);
            }
            if let Some(kind) = self.test_sequence.iter().find(|k| k.is_barrier()) {
                return Err(ConfigError::BarrierInTestSequence(*kind));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn flash_interval(&self) -> Duration {
        Duration::from_millis(self.flash_interval_ms)
    }
}
