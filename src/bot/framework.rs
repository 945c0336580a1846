use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, GatewayIntents, GuildId};
use tracing::{error, info, warn};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::commands;
use crate::config::Settings;
use crate::constants::embeds;
use crate::db::ConfigStore;
use crate::handlers::event_handler::event_handler;

pub async fn run(settings: Settings, store: Arc<dyn ConfigStore>) -> Result<(), Error> {
    let data = Arc::new(Data::new(store, settings.clone()));

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::config::set_admin_role(),
                commands::config::set_raid_channel(),
                commands::config::set_destination_channel(),
                commands::config::get_configs(),
                commands::config::unset_config(),
                commands::raid::move_raid(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: None, // Slash commands only
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as {}", ready.user.name);

                let commands = &framework.options().commands;
                match data.settings.guild_id {
                    Some(guild_id) => {
                        let guild_id = GuildId::new(guild_id);
                        poise::builtins::register_in_guild(ctx, commands, guild_id)
                            .await
                            .map_err(|e| {
                                error!("Failed to register commands in guild {}: {:?}", guild_id, e);
                                Error::Serenity(e)
                            })?;
                        info!("Registered {} commands in guild {}", commands.len(), guild_id);
                    }
                    None => {
                        poise::builtins::register_globally(ctx, commands)
                            .await
                            .map_err(|e| {
                                error!("Failed to register commands globally: {:?}", e);
                                Error::Serenity(e)
                            })?;
                        info!("Registered {} commands globally", commands.len());
                        info!("Note: Global commands can take up to 1 hour to appear in all servers");
                    }
                }

                Ok(data)
            })
        })
        .build();

    // Voice states populate the cache used to snapshot the raid channel
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .map_err(Error::Serenity)?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, stopping shards...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord client...");
    client.start().await.map_err(Error::Serenity)
}

/// Single place where a failed invocation gets its user-visible reply
async fn on_error(error: poise::FrameworkError<'_, Arc<Data>, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            match &error {
                Error::PermissionDenied(detail) => {
                    warn!(
                        "User '{}' ({}) tried to use /{} without sufficient permissions: {}",
                        ctx.author().name,
                        ctx.author().id,
                        ctx.command().name,
                        detail
                    );
                }
                Error::Custom(msg) => {
                    info!("/{} rejected: {}", ctx.command().name, msg);
                }
                _ => {
                    error!("Command /{} failed: {:?}", ctx.command().name, error);
                }
            }

            let embed = embeds::error_embed().description(error.user_message());
            let _ = ctx
                .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            warn!("Argument parse error in /{}: {}", ctx.command().name, error);
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .content(format!("Invalid argument: {}", error))
                        .ephemeral(true),
                )
                .await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            // Prefix commands are disabled
        }
        err => {
            error!("Framework error: {:?}", err);
            // Builtin handler replies to the invoking user where the variant has one
            if let Err(e) = poise::builtins::on_error(err).await {
                error!("Failed to report framework error: {:?}", e);
            }
        }
    }
}
