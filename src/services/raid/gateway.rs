use serenity::all::{ChannelId, ChannelType, Context, GuildId, UserId};
use serenity::async_trait;
use tracing::debug;

use crate::bot::error::Error;

/// The slice of the Discord gateway the raid mover needs
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Whether `channel_id` is a live voice (or stage) channel in the guild
    async fn voice_channel_exists(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, Error>;

    /// Point-in-time list of members connected to a voice channel
    async fn voice_members(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, Error>;

    /// Relocate one connected member into `channel_id`
    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), Error>;
}

/// [`VoiceGateway`] backed by the serenity cache and HTTP client
#[derive(Clone)]
pub struct SerenityGateway {
    ctx: Context,
}

impl SerenityGateway {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

fn is_voice(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Voice | ChannelType::Stage)
}

#[async_trait]
impl VoiceGateway for SerenityGateway {
    async fn voice_channel_exists(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, Error> {
        let cached = self
            .ctx
            .cache
            .guild(guild_id)
            .map(|guild| guild.channels.get(&channel_id).map(|c| is_voice(c.kind)));

        match cached {
            Some(found) => Ok(found.unwrap_or(false)),
            None => {
                debug!("Guild {} not cached, fetching channels over HTTP", guild_id);
                let channels = guild_id.channels(&self.ctx).await?;
                Ok(channels
                    .get(&channel_id)
                    .map(|c| is_voice(c.kind))
                    .unwrap_or(false))
            }
        }
    }

    async fn voice_members(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, Error> {
        // Voice states are only delivered through the gateway, so the cache is the source
        let guild = self
            .ctx
            .cache
            .guild(guild_id)
            .ok_or(Error::GuildUnavailable(guild_id.get()))?;

        let members = guild
            .voice_states
            .values()
            .filter(|vs| vs.channel_id == Some(channel_id))
            .map(|vs| vs.user_id)
            .collect();

        Ok(members)
    }

    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), Error> {
        guild_id.move_member(&self.ctx, user_id, channel_id).await?;
        Ok(())
    }
}
