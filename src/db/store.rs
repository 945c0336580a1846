use serenity::all::GuildId;
use serenity::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::bot::error::Error;
use crate::db::models::{GuildSettings, SettingField};
use crate::db::queries::guild_settings;

/// Durable per-guild settings.
///
/// A guild that was never configured reads back as [`GuildSettings::empty`];
/// absence is not an error. Writes target exactly one field and are visible
/// to the next `get` once they return.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, guild_id: GuildId) -> Result<GuildSettings, Error>;

    /// Set (`Some`) or clear (`None`) one field of the guild's settings
    async fn set(
        &self,
        guild_id: GuildId,
        field: SettingField,
        value: Option<u64>,
    ) -> Result<GuildSettings, Error>;
}

/// Postgres-backed settings store
#[derive(Debug, Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn get(&self, guild_id: GuildId) -> Result<GuildSettings, Error> {
        let row = guild_settings::get(&self.pool, guild_id.get() as i64).await?;
        Ok(row.unwrap_or_else(|| GuildSettings::empty(guild_id)))
    }

    async fn set(
        &self,
        guild_id: GuildId,
        field: SettingField,
        value: Option<u64>,
    ) -> Result<GuildSettings, Error> {
        let settings = guild_settings::set_field(
            &self.pool,
            guild_id.get() as i64,
            field,
            value.map(|v| v as i64),
        )
        .await?;

        debug!("Guild {} {} set to {:?}", guild_id, field.column(), value);

        Ok(settings)
    }
}
