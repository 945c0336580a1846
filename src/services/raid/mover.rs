use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use serenity::all::{ChannelId, GuildId, UserId};
use tracing::{debug, info, warn};

use crate::bot::error::Error;
use crate::config::Settings;
use crate::db::ConfigStore;
use crate::services::raid::gateway::VoiceGateway;

/// Pacing and bounds for a raid move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOptions {
    /// Pause after each relocation call
    pub delay: Duration,
    /// Upper bound on a single relocation call
    pub move_timeout: Duration,
    /// Maximum number of snapshot-and-drain passes
    pub max_passes: u32,
}

impl MoveOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            delay: settings.move_delay,
            move_timeout: settings.move_timeout,
            max_passes: settings.max_drain_passes.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Members relocated at least once and not failing afterwards
    pub moved: BTreeSet<UserId>,
    /// Members whose relocation failed, with the reason
    pub failures: BTreeMap<UserId, String>,
    /// Snapshot-and-drain passes performed
    pub passes: u32,
    /// The pass cap was hit while the channel still had members
    pub exhausted: bool,
    /// Re-reading the raid channel failed after at least one pass
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl MoveReport {
    /// Distinct members a relocation was attempted for
    pub fn attempted(&self) -> usize {
        self.moved.len() + self.failures.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Raid or destination channel is not set
    NotConfigured,
    /// A configured channel no longer resolves to a voice channel
    ChannelsInvalid,
    /// The raid channel was empty
    NoMembers,
    Moved(MoveReport),
}

/// Move everyone in the guild's raid channel into its destination channel.
///
/// The raid channel is re-read after every pass so members who join mid-move
/// are picked up too, until it is empty or `max_passes` is reached. A failed
/// relocation is recorded and that member is skipped for the rest of the call;
/// it never stops the batch.
pub async fn move_raid<S, G>(
    store: &S,
    gateway: &G,
    guild_id: GuildId,
    options: MoveOptions,
) -> Result<MoveOutcome, Error>
where
    S: ConfigStore + ?Sized,
    G: VoiceGateway + ?Sized,
{
    let settings = store.get(guild_id).await?;

    let Some((raid_channel, destination)) = settings.raid_route() else {
        debug!("Raid route not configured for guild {}", guild_id);
        return Ok(MoveOutcome::NotConfigured);
    };

    if raid_channel == destination
        || !gateway.voice_channel_exists(guild_id, raid_channel).await?
        || !gateway.voice_channel_exists(guild_id, destination).await?
    {
        warn!(
            "Configured channels are invalid in guild {} (raid {}, destination {})",
            guild_id, raid_channel, destination
        );
        return Ok(MoveOutcome::ChannelsInvalid);
    }

    let started = Instant::now();
    let mut report = MoveReport::default();

    loop {
        let snapshot = match gateway.voice_members(guild_id, raid_channel).await {
            Ok(snapshot) => snapshot,
            Err(e) if report.passes > 0 => {
                // Members were already moved; report them rather than the error
                warn!(
                    "Could not re-read raid channel {} after pass {}: {}",
                    raid_channel, report.passes, e
                );
                report.interrupted = true;
                break;
            }
            Err(e) => return Err(e),
        };

        let pending: Vec<UserId> = snapshot
            .into_iter()
            .filter(|user_id| !report.failures.contains_key(user_id))
            .collect();

        if pending.is_empty() {
            if report.passes == 0 {
                info!("No members to move in raid channel {}", raid_channel);
                return Ok(MoveOutcome::NoMembers);
            }
            break;
        }

        if report.passes >= options.max_passes {
            warn!(
                "Raid channel {} still has {} members after {} passes, giving up",
                raid_channel,
                pending.len(),
                report.passes
            );
            report.exhausted = true;
            break;
        }

        report.passes += 1;
        info!(
            "Pass {}: moving {} members from {} to {} in guild {}",
            report.passes,
            pending.len(),
            raid_channel,
            destination,
            guild_id
        );

        drain_pass(gateway, guild_id, &pending, destination, options, &mut report).await;
    }

    report.elapsed = started.elapsed();
    info!(
        "Raid move in guild {} finished: {} moved, {} failed, {} passes",
        guild_id,
        report.moved.len(),
        report.failures.len(),
        report.passes
    );

    Ok(MoveOutcome::Moved(report))
}

async fn drain_pass<G>(
    gateway: &G,
    guild_id: GuildId,
    members: &[UserId],
    destination: ChannelId,
    options: MoveOptions,
    report: &mut MoveReport,
) where
    G: VoiceGateway + ?Sized,
{
    for &user_id in members {
        let result = tokio::time::timeout(
            options.move_timeout,
            gateway.move_member(guild_id, user_id, destination),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                debug!("Moved member {}", user_id);
                report.moved.insert(user_id);
            }
            Ok(Err(e)) => {
                warn!("Could not move member {}: {}", user_id, e);
                report.moved.remove(&user_id);
                report.failures.insert(user_id, e.to_string());
            }
            Err(_) => {
                warn!(
                    "Moving member {} timed out after {:?}",
                    user_id, options.move_timeout
                );
                report.moved.remove(&user_id);
                report.failures.insert(user_id, "timed out".to_string());
            }
        }

        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use serenity::async_trait;

    use super::*;
    use crate::db::models::SettingField;
    use crate::db::store::memory::MemoryConfigStore;

    const GUILD: GuildId = GuildId::new(7);
    const RAID: ChannelId = ChannelId::new(101);
    const DEST: ChannelId = ChannelId::new(202);

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    fn options() -> MoveOptions {
        MoveOptions {
            delay: Duration::ZERO,
            move_timeout: Duration::from_secs(5),
            max_passes: 5,
        }
    }

    #[derive(Default)]
    struct FakeGateway {
        channels: Mutex<HashMap<ChannelId, Vec<UserId>>>,
        failing: HashSet<UserId>,
        stuck: HashSet<UserId>,
        /// Joins the raid channel right after the first successful move
        late_joiners: Mutex<Vec<UserId>>,
        /// Rejoins the raid channel every time it is moved
        bouncer: Option<UserId>,
        move_calls: Mutex<Vec<UserId>>,
        /// Fail every `voice_members` call after this many succeed
        snapshots_before_failure: Option<usize>,
        snapshots: Mutex<usize>,
    }

    impl FakeGateway {
        fn with_members(members: &[u64]) -> Self {
            let gateway = Self::default();
            {
                let mut channels = gateway.channels.lock().unwrap();
                channels.insert(RAID, members.iter().map(|&id| user(id)).collect());
                channels.insert(DEST, Vec::new());
            }
            gateway
        }

        fn members(&self, channel: ChannelId) -> Vec<UserId> {
            self.channels.lock().unwrap().get(&channel).cloned().unwrap_or_default()
        }

        fn calls(&self) -> Vec<UserId> {
            self.move_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VoiceGateway for FakeGateway {
        async fn voice_channel_exists(
            &self,
            _guild_id: GuildId,
            channel_id: ChannelId,
        ) -> Result<bool, Error> {
            Ok(self.channels.lock().unwrap().contains_key(&channel_id))
        }

        async fn voice_members(
            &self,
            _guild_id: GuildId,
            channel_id: ChannelId,
        ) -> Result<Vec<UserId>, Error> {
            let mut snapshots = self.snapshots.lock().unwrap();
            if let Some(limit) = self.snapshots_before_failure {
                if *snapshots >= limit {
                    return Err(Error::GuildUnavailable(GUILD.get()));
                }
            }
            *snapshots += 1;
            Ok(self.members(channel_id))
        }

        async fn move_member(
            &self,
            _guild_id: GuildId,
            user_id: UserId,
            channel_id: ChannelId,
        ) -> Result<(), Error> {
            self.move_calls.lock().unwrap().push(user_id);

            if self.stuck.contains(&user_id) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(&user_id) {
                return Err(Error::custom("Missing Permissions"));
            }

            let mut channels = self.channels.lock().unwrap();
            for members in channels.values_mut() {
                members.retain(|m| *m != user_id);
            }
            channels.entry(channel_id).or_default().push(user_id);

            if self.bouncer == Some(user_id) {
                channels.entry(RAID).or_default().push(user_id);
            }
            let joiners: Vec<UserId> = self.late_joiners.lock().unwrap().drain(..).collect();
            channels.entry(RAID).or_default().extend(joiners);

            Ok(())
        }
    }

    async fn configured_store() -> MemoryConfigStore {
        let store = MemoryConfigStore::new();
        store.set(GUILD, SettingField::RaidChannel, Some(RAID.get())).await.unwrap();
        store.set(GUILD, SettingField::DestinationChannel, Some(DEST.get())).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_unconfigured_guild() {
        let store = MemoryConfigStore::new();
        let gateway = FakeGateway::with_members(&[1, 2]);

        let outcome = move_raid(&store, &gateway, GUILD, options()).await.unwrap();
        assert_eq!(outcome, MoveOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn test_partially_configured_guild() {
        let store = MemoryConfigStore::new();
        store.set(GUILD, SettingField::RaidChannel, Some(RAID.get())).await.unwrap();
        let gateway = FakeGateway::with_members(&[1]);

        let outcome = move_raid(&store, &gateway, GUILD, options()).await.unwrap();
        assert_eq!(outcome, MoveOutcome::NotConfigured);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_channel_is_invalid() {
        let store = configured_store().await;
        let gateway = FakeGateway::with_members(&[1]);
        gateway.channels.lock().unwrap().remove(&DEST);

        let outcome = move_raid(&store, &gateway, GUILD, options()).await.unwrap();
        assert_eq!(outcome, MoveOutcome::ChannelsInvalid);
    }

    #[tokio::test]
    async fn test_deleted_raid_channel_is_invalid() {
        let store = configured_store().await;
        let gateway = FakeGateway::with_members(&[1]);
        gateway.channels.lock().unwrap().remove(&RAID);

        let outcome = move_raid(&store, &gateway, GUILD, options()).await.unwrap();
        assert_eq!(outcome, MoveOutcome::ChannelsInvalid);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_resnapshot_keeps_partial_report() {
        let store = configured_store().await;
        let mut gateway = FakeGateway::with_members(&[1, 2, 3]);
        gateway.snapshots_before_failure = Some(1);

        let MoveOutcome::Moved(report) = move_raid(&store, &gateway, GUILD, options()).await.unwrap() else {
            panic!("expected a move");
        };

        assert!(report.interrupted);
        assert!(!report.exhausted);
        assert_eq!(report.passes, 1);
        assert_eq!(report.moved, BTreeSet::from([user(1), user(2), user(3)]));
        assert_eq!(gateway.members(DEST).len(), 3);
    }

    #[tokio::test]
    async fn test_failed_first_snapshot_is_an_error() {
        let store = configured_store().await;
        let mut gateway = FakeGateway::with_members(&[1, 2]);
        gateway.snapshots_before_failure = Some(0);

        let result = move_raid(&store, &gateway, GUILD, options()).await;
        assert!(matches!(result, Err(Error::GuildUnavailable(7))));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_same_channel_is_invalid() {
        let store = MemoryConfigStore::new();
        store.set(GUILD, SettingField::RaidChannel, Some(RAID.get())).await.unwrap();
        store.set(GUILD, SettingField::DestinationChannel, Some(RAID.get())).await.unwrap();
        let gateway = FakeGateway::with_members(&[1]);

        let outcome = move_raid(&store, &gateway, GUILD, options()).await.unwrap();
        assert_eq!(outcome, MoveOutcome::ChannelsInvalid);
    }

    #[tokio::test]
    async fn test_empty_raid_channel() {
        let store = configured_store().await;
        let gateway = FakeGateway::with_members(&[]);

        let outcome = move_raid(&store, &gateway, GUILD, options()).await.unwrap();
        assert_eq!(outcome, MoveOutcome::NoMembers);
    }

    #[tokio::test]
    async fn test_moves_everyone() {
        let store = configured_store().await;
        let gateway = FakeGateway::with_members(&[1, 2, 3]);

        let MoveOutcome::Moved(report) = move_raid(&store, &gateway, GUILD, options()).await.unwrap() else {
            panic!("expected a move");
        };

        assert_eq!(report.attempted(), 3);
        assert!(report.failures.is_empty());
        assert_eq!(report.passes, 1);
        assert!(!report.exhausted);
        assert!(gateway.members(RAID).is_empty());
        assert_eq!(gateway.members(DEST).len(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_batch() {
        let store = configured_store().await;
        let mut gateway = FakeGateway::with_members(&[1, 2, 3]);
        gateway.failing.insert(user(1));

        let MoveOutcome::Moved(report) = move_raid(&store, &gateway, GUILD, options()).await.unwrap() else {
            panic!("expected a move");
        };

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures.contains_key(&user(1)));
        assert_eq!(report.moved, BTreeSet::from([user(2), user(3)]));
        assert_eq!(gateway.members(DEST), vec![user(2), user(3)]);
        // The failed member is not retried in later passes
        assert_eq!(gateway.calls(), vec![user(1), user(2), user(3)]);
        assert!(!report.exhausted);
    }

    #[tokio::test]
    async fn test_late_joiners_are_moved() {
        let store = configured_store().await;
        let gateway = FakeGateway::with_members(&[1, 2]);
        gateway.late_joiners.lock().unwrap().push(user(9));

        let MoveOutcome::Moved(report) = move_raid(&store, &gateway, GUILD, options()).await.unwrap() else {
            panic!("expected a move");
        };

        assert_eq!(report.moved, BTreeSet::from([user(1), user(2), user(9)]));
        assert_eq!(report.passes, 2);
        assert!(gateway.members(RAID).is_empty());
    }

    #[tokio::test]
    async fn test_pass_cap_bounds_a_bouncing_member() {
        let store = configured_store().await;
        let gateway = FakeGateway {
            bouncer: Some(user(4)),
            ..FakeGateway::with_members(&[4, 5])
        };

        let MoveOutcome::Moved(report) = move_raid(&store, &gateway, GUILD, options()).await.unwrap() else {
            panic!("expected a move");
        };

        assert!(report.exhausted);
        assert_eq!(report.passes, options().max_passes);
        assert_eq!(report.attempted(), 2);
        assert_eq!(gateway.members(RAID), vec![user(4)]);
    }

    #[tokio::test]
    async fn test_slow_move_times_out_without_blocking_others() {
        let store = configured_store().await;
        let mut gateway = FakeGateway::with_members(&[1, 2]);
        gateway.stuck.insert(user(1));
        let opts = MoveOptions {
            move_timeout: Duration::from_millis(20),
            ..options()
        };

        let MoveOutcome::Moved(report) = move_raid(&store, &gateway, GUILD, opts).await.unwrap() else {
            panic!("expected a move");
        };

        assert_eq!(report.failures.get(&user(1)).map(String::as_str), Some("timed out"));
        assert!(report.moved.contains(&user(2)));
    }

    #[test]
    fn test_options_from_settings_clamps_passes() {
        let settings = Settings {
            max_drain_passes: 0,
            ..Settings::for_tests()
        };
        let opts = MoveOptions::from_settings(&settings);
        assert_eq!(opts.max_passes, 1);
        assert_eq!(opts.delay, settings.move_delay);
    }
}
