use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, FullEvent};
use tracing::{debug, info};

use crate::bot::data::Data;
use crate::bot::error::Error;

pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    _data: &Arc<Data>,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot, .. } => {
            info!(
                "Bot ready as {} in {} guilds",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
        }

        FullEvent::GuildCreate { guild, is_new } => {
            if *is_new == Some(true) {
                info!("Joined guild '{}' ({})", guild.name, guild.id);
            } else {
                debug!("Guild '{}' ({}) available", guild.name, guild.id);
            }
        }

        FullEvent::GuildDelete { incomplete, .. } => {
            // Settings rows are kept; there is no cleanup on removal
            info!("Removed from guild {}", incomplete.id);
        }

        _ => {}
    }

    Ok(())
}
