use serenity::all::{Context as SerenityContext, GuildId, UserId};
use tracing::debug;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::services::auth::{authorizer, Authorized, Caller, GuildScope, Policy};

/// Check if a member has administrator permissions
pub async fn is_admin(ctx: &SerenityContext, guild_id: GuildId, user_id: UserId) -> bool {
    if let Ok(member) = guild_id.member(ctx, user_id).await {
        #[allow(deprecated)]
        let permissions = member.permissions(ctx);
        return permissions.map(|p| p.administrator()).unwrap_or(false);
    }
    false
}

/// Guild and owner of the invocation, or `None` outside a guild
async fn guild_scope(ctx: Context<'_>) -> Result<Option<GuildScope>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(None);
    };

    let cached_owner = ctx.guild().map(|guild| guild.owner_id);
    let owner_id = match cached_owner {
        Some(owner_id) => owner_id,
        None => guild_id.to_partial_guild(ctx.http()).await?.owner_id,
    };

    Ok(Some(GuildScope { guild_id, owner_id }))
}

/// Permission snapshot of the invoking member
async fn caller_snapshot(ctx: Context<'_>, guild_id: GuildId) -> Caller {
    let user_id = ctx.author().id;

    let member = ctx
        .author_member()
        .await
        .map(|member| (member.permissions, member.roles.clone()));

    let Some((permissions, role_ids)) = member else {
        return Caller {
            user_id,
            is_administrator: false,
            role_ids: Vec::new(),
        };
    };

    // Interaction payloads carry resolved permissions; fall back to the cache otherwise
    let is_administrator = match permissions {
        Some(permissions) => permissions.administrator(),
        None => is_admin(ctx.serenity_context(), guild_id, user_id).await,
    };

    Caller {
        user_id,
        is_administrator,
        role_ids,
    }
}

/// Guard run first in every privileged command; yields the guild it was granted in
pub async fn authorize(ctx: Context<'_>, policy: Policy) -> Result<Authorized, Error> {
    let scope = guild_scope(ctx).await?;

    let caller = match scope {
        Some(scope) => caller_snapshot(ctx, scope.guild_id).await,
        None => Caller {
            user_id: ctx.author().id,
            is_administrator: false,
            role_ids: Vec::new(),
        },
    };

    let authorized =
        authorizer::require(ctx.data().store.as_ref(), scope, &caller, policy).await?;
    debug!(
        "User {} authorized for /{} via {:?}",
        caller.user_id,
        ctx.command().name,
        authorized.grant
    );

    Ok(authorized)
}
