use serenity::all::{GuildId, RoleId, UserId};
use tracing::debug;

use crate::bot::error::Error;
use crate::db::ConfigStore;

/// Who owns the guild an invocation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildScope {
    pub guild_id: GuildId,
    pub owner_id: UserId,
}

/// Permission snapshot of the invoking member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub is_administrator: bool,
    pub role_ids: Vec<RoleId>,
}

/// Which resolution tiers a command accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Guild owner or built-in administrator. Used for reassigning the admin role,
    /// so a delegated admin cannot hand the role to someone else.
    OwnerOrAdmin,
    /// Owner, administrator, or the guild's delegated admin role
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Owner,
    Administrator,
    DelegatedRole(RoleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted(Grant),
    Denied,
}

/// A granted check, carrying the guild it was granted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized {
    pub guild_id: GuildId,
    pub grant: Grant,
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted(_))
    }
}

/// Resolve whether `caller` may run a command guarded by `policy`.
///
/// Tiers are checked in order and short-circuit: owner, built-in administrator,
/// then (for [`Policy::AdminOnly`]) the delegated role stored for the guild.
/// The store is only read when the first two tiers fail, and never for a
/// guild-less invocation.
pub async fn resolve<S>(
    store: &S,
    scope: Option<GuildScope>,
    caller: &Caller,
    policy: Policy,
) -> Result<Decision, Error>
where
    S: ConfigStore + ?Sized,
{
    let Some(scope) = scope else {
        debug!("User {} invoked outside a guild", caller.user_id);
        return Ok(Decision::Denied);
    };

    if caller.user_id == scope.owner_id {
        return Ok(Decision::Granted(Grant::Owner));
    }

    if caller.is_administrator {
        return Ok(Decision::Granted(Grant::Administrator));
    }

    if policy == Policy::OwnerOrAdmin {
        return Ok(Decision::Denied);
    }

    let settings = store.get(scope.guild_id).await?;
    match settings.admin_role() {
        Some(role_id) if caller.role_ids.contains(&role_id) => {
            Ok(Decision::Granted(Grant::DelegatedRole(role_id)))
        }
        _ => Ok(Decision::Denied),
    }
}

/// Like [`resolve`], but turns a denial into [`Error::PermissionDenied`]
pub async fn require<S>(
    store: &S,
    scope: Option<GuildScope>,
    caller: &Caller,
    policy: Policy,
) -> Result<Authorized, Error>
where
    S: ConfigStore + ?Sized,
{
    // A grant is only possible inside a guild, so `scope` is always set here
    match (resolve(store, scope, caller, policy).await?, scope) {
        (Decision::Granted(grant), Some(scope)) => Ok(Authorized {
            guild_id: scope.guild_id,
            grant,
        }),
        _ => Err(Error::PermissionDenied(format!(
            "user {} failed {:?} in guild {}",
            caller.user_id,
            policy,
            scope
                .map(|s| s.guild_id.to_string())
                .unwrap_or_else(|| "<none>".to_string())
        ))),
    }
}
