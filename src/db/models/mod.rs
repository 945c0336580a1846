mod guild_settings;

pub use guild_settings::{GuildSettings, SettingField};
