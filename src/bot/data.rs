use std::fmt;
use std::sync::Arc;

use crate::config::Settings;
use crate::db::ConfigStore;

/// Shared data available to all commands and handlers
pub struct Data {
    pub store: Arc<dyn ConfigStore>,
    pub settings: Settings,
}

impl Data {
    pub fn new(store: Arc<dyn ConfigStore>, settings: Settings) -> Self {
        Self { store, settings }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("guild_id", &self.settings.guild_id)
            .field("max_drain_passes", &self.settings.max_drain_passes)
            .finish_non_exhaustive()
    }
}

pub type Context<'a> = poise::Context<'a, Arc<Data>, crate::bot::error::Error>;
