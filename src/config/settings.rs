use std::env;
use std::time::Duration;

use crate::constants::timeouts::{
    DEFAULT_MAX_DRAIN_PASSES, DEFAULT_MOVE_DELAY_MS, DEFAULT_MOVE_TIMEOUT_SECONDS,
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub database_url: String,
    /// Register commands in this guild only (development)
    pub guild_id: Option<u64>,
    /// Pause between member relocations
    pub move_delay: Duration,
    /// Timeout for a single member relocation
    pub move_timeout: Duration,
    /// Cap on raid channel drain passes
    pub max_drain_passes: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .or_else(|| lookup("DISCORD_BOT_TOKEN"))
            .filter(|s| !s.is_empty())
            .ok_or("DISCORD_TOKEN environment variable not set")?;

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .ok_or("DATABASE_URL environment variable not set")?;

        let guild_id = lookup("GUILD_ID").and_then(|s| s.parse::<u64>().ok());

        let move_delay_ms = lookup("MOVE_DELAY_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MOVE_DELAY_MS);

        let move_timeout_secs = lookup("MOVE_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_MOVE_TIMEOUT_SECONDS);

        let max_drain_passes = lookup("MAX_DRAIN_PASSES")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|passes| *passes > 0)
            .unwrap_or(DEFAULT_MAX_DRAIN_PASSES);

        Ok(Self {
            discord_token,
            database_url,
            guild_id,
            move_delay: Duration::from_millis(move_delay_ms),
            move_timeout: Duration::from_secs(move_timeout_secs),
            max_drain_passes,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            discord_token: "token".to_string(),
            database_url: "postgres://localhost/raidmover".to_string(),
            guild_id: None,
            move_delay: Duration::from_millis(DEFAULT_MOVE_DELAY_MS),
            move_timeout: Duration::from_secs(DEFAULT_MOVE_TIMEOUT_SECONDS),
            max_drain_passes: DEFAULT_MAX_DRAIN_PASSES,
        }
    }
}
