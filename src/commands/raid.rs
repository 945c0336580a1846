use tracing::info;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::services::auth::Policy;
use crate::services::raid::{self, MoveOptions, MoveOutcome, SerenityGateway};
use crate::utils::formatting::describe_move_report;
use crate::utils::permissions::authorize;

/// Move everyone in the raid channel to the destination channel
#[poise::command(slash_command, rename = "move-raid")]
pub async fn move_raid(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = authorize(ctx, Policy::AdminOnly).await?.guild_id;

    // Moving a large raid can take longer than the interaction ack window
    ctx.defer_ephemeral().await?;

    info!("User {} started a raid move in guild {}", ctx.author().id, guild_id);

    let gateway = SerenityGateway::new(ctx.serenity_context().clone());
    let options = MoveOptions::from_settings(&ctx.data().settings);
    let outcome = raid::move_raid(ctx.data().store.as_ref(), &gateway, guild_id, options).await?;

    let embed = match outcome {
        MoveOutcome::NotConfigured => embeds::warning_embed()
            .title("Not Configured")
            .description("Raid or destination channel not set. Use `/set-raid-channel` and `/set-destination-channel` first."),
        MoveOutcome::ChannelsInvalid => embeds::error_embed()
            .title("Invalid Channels")
            .description("Configured channels are invalid. They may have been deleted; set them again."),
        MoveOutcome::NoMembers => embeds::warning_embed()
            .title("Nobody To Move")
            .description("No members in the raid channel."),
        MoveOutcome::Moved(report) => {
            let embed = if report.failures.is_empty() && !report.exhausted && !report.interrupted {
                embeds::success_embed().title("Raid Moved")
            } else {
                embeds::warning_embed().title("Raid Partially Moved")
            };
            embed.description(describe_move_report(&report))
        }
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
