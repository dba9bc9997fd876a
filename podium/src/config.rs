//! Engine configuration.
//!
//! Consolidates the engine's environment variable reads and validates them.

use thiserror::Error;

use crate::event::EventConfig;
use crate::randomizer::SeededRandomizer;

/// Defaults applied when events are created without explicit settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Round-robin rounds per participant for head-to-head events
    pub default_rounds: u32,
    /// Matches per participant for individual and team events
    pub competitions_per_team: u32,
    /// Fixed seed for shuffles and coin flips; `None` seeds from the OS
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_rounds: 4,
            competitions_per_team: 1,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// - `PODIUM_DEFAULT_ROUNDS` (default: 4)
    /// - `PODIUM_COMPETITIONS_PER_TEAM` (default: 1)
    /// - `PODIUM_RNG_SEED` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            default_rounds: parse_env("PODIUM_DEFAULT_ROUNDS")?.unwrap_or(defaults.default_rounds),
            competitions_per_team: parse_env("PODIUM_COMPETITIONS_PER_TEAM")?
                .unwrap_or(defaults.competitions_per_team),
            rng_seed: parse_env("PODIUM_RNG_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_rounds == 0 {
            return Err(ConfigError::Invalid {
                var: "PODIUM_DEFAULT_ROUNDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        if self.competitions_per_team == 0 {
            return Err(ConfigError::Invalid {
                var: "PODIUM_COMPETITIONS_PER_TEAM".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Head-to-head event with the configured number of rounds
    pub fn head_to_head_event(&self, name: impl Into<String>) -> EventConfig {
        EventConfig::head_to_head(name, self.default_rounds)
    }

    /// Individual event with the configured competitions per team
    pub fn individual_event(&self, name: impl Into<String>) -> EventConfig {
        EventConfig::individual(name, self.competitions_per_team)
    }

    /// Team-scored event with the configured competitions per team
    pub fn team_event(&self, name: impl Into<String>) -> EventConfig {
        EventConfig::team(name, self.competitions_per_team)
    }

    /// Randomizer honouring the configured seed
    pub fn randomizer(&self) -> SeededRandomizer {
        SeededRandomizer::new(self.rng_seed)
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingRequired { var: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional variable; a present but malformed value is an error
pub(crate) fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        // SAFETY: tests touching the environment run serially
        unsafe {
            std::env::remove_var("PODIUM_DEFAULT_ROUNDS");
            std::env::remove_var("PODIUM_COMPETITIONS_PER_TEAM");
            std::env::remove_var("PODIUM_RNG_SEED");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        assert_eq!(EngineConfig::from_env().unwrap(), EngineConfig::default());
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        unsafe {
            std::env::set_var("PODIUM_DEFAULT_ROUNDS", "2");
            std::env::set_var("PODIUM_RNG_SEED", "42");
        }
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.default_rounds, 2);
        assert_eq!(config.rng_seed, Some(42));
        clear();
    }

    #[test]
    #[serial]
    fn test_malformed_value_is_rejected() {
        clear();
        unsafe {
            std::env::set_var("PODIUM_RNG_SEED", "lucky");
        }
        let err = EngineConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("PODIUM_RNG_SEED"));
        clear();
    }

    #[test]
    fn test_zero_rounds_invalid() {
        let config = EngineConfig {
            default_rounds: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }
}
