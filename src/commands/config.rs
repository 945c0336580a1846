use poise::serenity_prelude::{Channel, Role};
use tracing::info;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::db::models::SettingField;
use crate::services::auth::Policy;
use crate::utils::formatting::{describe_setting, mention_channel, mention_role};
use crate::utils::permissions::authorize;

/// Set the role allowed to use the admin commands
#[poise::command(slash_command, rename = "set-admin-role")]
pub async fn set_admin_role(
    ctx: Context<'_>,
    #[description = "Role that may configure the bot and move the raid"] role: Role,
) -> Result<(), Error> {
    let guild_id = authorize(ctx, Policy::OwnerOrAdmin).await?.guild_id;

    ctx.data()
        .store
        .set(guild_id, SettingField::AdminRole, Some(role.id.get()))
        .await?;

    info!(
        "Admin role set to '{}' in guild {} by user {}",
        role.name,
        guild_id,
        ctx.author().id
    );

    let embed = embeds::success_embed()
        .title("Admin Role Set")
        .description(format!("Admin role set to {}", mention_role(role.id.get())));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

/// Set the voice channel raiders are moved out of
#[poise::command(slash_command, rename = "set-raid-channel")]
pub async fn set_raid_channel(
    ctx: Context<'_>,
    #[description = "Voice channel the raid gathers in"]
    #[channel_types("Voice", "Stage")]
    channel: Channel,
) -> Result<(), Error> {
    set_channel(ctx, SettingField::RaidChannel, channel).await
}

/// Set the voice channel raiders are moved into
#[poise::command(slash_command, rename = "set-destination-channel")]
pub async fn set_destination_channel(
    ctx: Context<'_>,
    #[description = "Voice channel the raid is moved into"]
    #[channel_types("Voice", "Stage")]
    channel: Channel,
) -> Result<(), Error> {
    set_channel(ctx, SettingField::DestinationChannel, channel).await
}

async fn set_channel(ctx: Context<'_>, field: SettingField, channel: Channel) -> Result<(), Error> {
    let guild_id = authorize(ctx, Policy::AdminOnly).await?.guild_id;

    ctx.data()
        .store
        .set(guild_id, field, Some(channel.id().get()))
        .await?;

    info!(
        "{} set to {} in guild {} by user {}",
        field.label(),
        channel.id(),
        guild_id,
        ctx.author().id
    );

    let embed = embeds::success_embed()
        .title(format!("{} Set", field.label()))
        .description(format!(
            "{} set to {}",
            field.label(),
            mention_channel(channel.id().get())
        ));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

/// Show this server's raid mover settings
#[poise::command(slash_command, rename = "get-configs")]
pub async fn get_configs(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = authorize(ctx, Policy::AdminOnly).await?.guild_id;

    let settings = ctx.data().store.get(guild_id).await?;
    info!(
        "Settings for guild {} requested by user {}: {:?}",
        guild_id,
        ctx.author().id,
        settings
    );

    let mut embed = embeds::standard_embed().title("Raid Mover Settings");
    for field in SettingField::ALL {
        embed = embed.field(field.label(), describe_setting(&settings, field), false);
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

/// Setting that can be cleared
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ConfigField {
    #[name = "admin-role"]
    AdminRole,
    #[name = "raid-channel"]
    RaidChannel,
    #[name = "destination-channel"]
    DestinationChannel,
}

impl ConfigField {
    pub fn setting(self) -> SettingField {
        match self {
            ConfigField::AdminRole => SettingField::AdminRole,
            ConfigField::RaidChannel => SettingField::RaidChannel,
            ConfigField::DestinationChannel => SettingField::DestinationChannel,
        }
    }

    /// Clearing the admin role is gated like setting it
    pub fn policy(self) -> Policy {
        match self {
            ConfigField::AdminRole => Policy::OwnerOrAdmin,
            ConfigField::RaidChannel | ConfigField::DestinationChannel => Policy::AdminOnly,
        }
    }
}

/// Clear one of this server's raid mover settings
#[poise::command(slash_command, rename = "unset-config")]
pub async fn unset_config(
    ctx: Context<'_>,
    #[description = "Setting to clear"] field: ConfigField,
) -> Result<(), Error> {
    let guild_id = authorize(ctx, field.policy()).await?.guild_id;
    let setting = field.setting();

    ctx.data().store.set(guild_id, setting, None).await?;

    info!(
        "{} cleared in guild {} by user {}",
        setting.label(),
        guild_id,
        ctx.author().id
    );

    let embed = embeds::success_embed()
        .title(format!("{} Cleared", setting.label()))
        .description(format!("{} is no longer set.", setting.label()));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
