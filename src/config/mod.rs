//! Configuration module - environment variable parsing for the driver

use std::env;

use crate::game::GameMode;

/// Driver configuration loaded from environment variables.
///
/// Every variable has a default so the binary runs out of the box.
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Rule set to run
    pub mode: GameMode,
    /// Simulation seed; defaults to the wall clock when unset
    pub seed: Option<u64>,
    /// Deathmatch score that ends the match
    pub frag_target: u32,
    /// Bot roster size for deathmatch-with-bots
    pub bot_count: u32,
    /// Wall-clock cap on the demo match (seconds)
    pub run_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env::var("MODE").as_deref() {
            Ok("cooperative") => GameMode::Cooperative,
            Ok("deathmatch") => GameMode::Deathmatch,
            Ok("deathmatch_bots") | Err(_) => GameMode::DeathmatchBots,
            Ok(_) => return Err(ConfigError::Invalid("MODE")),
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            mode,
            seed: parse_opt("SEED")?,
            frag_target: parse_opt("FRAG_TARGET")?.unwrap_or(20),
            bot_count: parse_opt("BOTS")?.unwrap_or(3),
            run_secs: parse_opt("RUN_SECS")?.unwrap_or(120),
        })
    }
}

fn parse_opt<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        // untouched variables in a fresh test process
        let config = Config::from_env().unwrap();
        assert_eq!(config.frag_target, 20);
        assert_eq!(config.bot_count, 3);
    }
}
