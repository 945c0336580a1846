use sqlx::PgPool;

use crate::db::models::{GuildSettings, SettingField};

pub async fn get(pool: &PgPool, guild_id: i64) -> Result<Option<GuildSettings>, sqlx::Error> {
    sqlx::query_as::<_, GuildSettings>(
        "SELECT * FROM guild_settings WHERE guild_id = $1"
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await
}

/// Upsert a single column, creating the row on first write.
/// Only the targeted column is touched on conflict.
pub async fn set_field(
    pool: &PgPool,
    guild_id: i64,
    field: SettingField,
    value: Option<i64>,
) -> Result<GuildSettings, sqlx::Error> {
    let query = match field {
        SettingField::AdminRole => {
            r#"
            INSERT INTO guild_settings (guild_id, admin_role_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id) DO UPDATE
            SET admin_role_id = EXCLUDED.admin_role_id, updated_at = NOW()
            RETURNING *
            "#
        }
        SettingField::RaidChannel => {
            r#"
            INSERT INTO guild_settings (guild_id, raid_channel_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id) DO UPDATE
            SET raid_channel_id = EXCLUDED.raid_channel_id, updated_at = NOW()
            RETURNING *
            "#
        }
        SettingField::DestinationChannel => {
            r#"
            INSERT INTO guild_settings (guild_id, destination_channel_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id) DO UPDATE
            SET destination_channel_id = EXCLUDED.destination_channel_id, updated_at = NOW()
            RETURNING *
            "#
        }
    };

    sqlx::query_as::<_, GuildSettings>(query)
        .bind(guild_id)
        .bind(value)
        .fetch_one(pool)
        .await
}
