use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, RoleId};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GuildSettings {
    pub guild_id: i64,
    pub admin_role_id: Option<i64>,
    pub raid_channel_id: Option<i64>,
    pub destination_channel_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GuildSettings {
    /// Settings for a guild that has never been configured
    pub fn empty(guild_id: GuildId) -> Self {
        Self {
            guild_id: guild_id.get() as i64,
            admin_role_id: None,
            raid_channel_id: None,
            destination_channel_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn admin_role(&self) -> Option<RoleId> {
        to_id(self.admin_role_id).map(RoleId::new)
    }

    pub fn raid_channel(&self) -> Option<ChannelId> {
        to_id(self.raid_channel_id).map(ChannelId::new)
    }

    pub fn destination_channel(&self) -> Option<ChannelId> {
        to_id(self.destination_channel_id).map(ChannelId::new)
    }

    /// Both channels of the raid move, if both are configured
    pub fn raid_route(&self) -> Option<(ChannelId, ChannelId)> {
        Some((self.raid_channel()?, self.destination_channel()?))
    }

    /// Current value of a single field
    pub fn field(&self, field: SettingField) -> Option<i64> {
        match field {
            SettingField::AdminRole => self.admin_role_id,
            SettingField::RaidChannel => self.raid_channel_id,
            SettingField::DestinationChannel => self.destination_channel_id,
        }
    }

    /// Overwrite a single field, leaving the others untouched
    pub fn apply(&mut self, field: SettingField, value: Option<i64>) {
        match field {
            SettingField::AdminRole => self.admin_role_id = value,
            SettingField::RaidChannel => self.raid_channel_id = value,
            SettingField::DestinationChannel => self.destination_channel_id = value,
        }
    }
}

// Snowflakes are never zero; a zero in the table is treated as unset.
fn to_id(raw: Option<i64>) -> Option<u64> {
    raw.filter(|id| *id > 0).map(|id| id as u64)
}

/// The independently settable columns of a guild's settings row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    AdminRole,
    RaidChannel,
    DestinationChannel,
}

impl SettingField {
    pub const ALL: [SettingField; 3] = [
        SettingField::AdminRole,
        SettingField::RaidChannel,
        SettingField::DestinationChannel,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SettingField::AdminRole => "admin_role_id",
            SettingField::RaidChannel => "raid_channel_id",
            SettingField::DestinationChannel => "destination_channel_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingField::AdminRole => "Admin role",
            SettingField::RaidChannel => "Raid channel",
            SettingField::DestinationChannel => "Destination channel",
        }
    }
}
