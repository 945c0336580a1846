use serenity::all::UserId;

use crate::constants::embeds::bullet_list;
use crate::constants::timeouts::format_duration;
use crate::db::models::{GuildSettings, SettingField};
use crate::services::raid::MoveReport;

/// Failures listed individually before the rest are summarised
const MAX_LISTED_FAILURES: usize = 10;

/// Format a user mention
pub fn mention_user(user_id: UserId) -> String {
    format!("<@{}>", user_id)
}

/// Format a channel mention
pub fn mention_channel(channel_id: u64) -> String {
    format!("<#{}>", channel_id)
}

/// Format a role mention
pub fn mention_role(role_id: u64) -> String {
    format!("<@&{}>", role_id)
}

/// Render one settings field as a mention, or "Not set"
pub fn describe_setting(settings: &GuildSettings, field: SettingField) -> String {
    match (field, settings.field(field)) {
        (_, None) => "Not set".to_string(),
        (SettingField::AdminRole, Some(id)) => mention_role(id as u64),
        (_, Some(id)) => mention_channel(id as u64),
    }
}

/// Human-readable summary of a finished raid move
pub fn describe_move_report(report: &MoveReport) -> String {
    let mut lines = vec![format!(
        "Moved **{}** of **{}** members in {} ({} pass{}).",
        report.moved.len(),
        report.attempted(),
        format_duration(report.elapsed),
        report.passes,
        if report.passes == 1 { "" } else { "es" }
    )];

    if report.exhausted {
        lines.push(
            "The raid channel kept refilling, so I stopped before it was empty.".to_string(),
        );
    }

    if report.interrupted {
        lines.push(
            "I lost track of the raid channel partway through; some members may still be in it."
                .to_string(),
        );
    }

    if !report.failures.is_empty() {
        let mut failed: Vec<String> = report
            .failures
            .iter()
            .take(MAX_LISTED_FAILURES)
            .map(|(user_id, reason)| format!("{}: {}", mention_user(*user_id), reason))
            .collect();
        if report.failures.len() > MAX_LISTED_FAILURES {
            failed.push(format!(
                "...and {} more",
                report.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        lines.push(format!("**Could not move:**\n{}", bullet_list(&failed)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serenity::all::GuildId;

    use super::*;

    #[test]
    fn test_describe_setting() {
        let mut settings = GuildSettings::empty(GuildId::new(55));
        assert_eq!(describe_setting(&settings, SettingField::AdminRole), "Not set");

        settings.apply(SettingField::AdminRole, Some(9));
        settings.apply(SettingField::RaidChannel, Some(101));
        assert_eq!(describe_setting(&settings, SettingField::AdminRole), "<@&9>");
        assert_eq!(describe_setting(&settings, SettingField::RaidChannel), "<#101>");
        assert_eq!(describe_setting(&settings, SettingField::DestinationChannel), "Not set");
    }

    #[test]
    fn test_describe_move_report() {
        let mut report = MoveReport {
            passes: 1,
            elapsed: Duration::from_millis(300),
            ..Default::default()
        };
        report.moved.insert(UserId::new(2));
        report.moved.insert(UserId::new(3));
        report.failures.insert(UserId::new(1), "Missing Permissions".to_string());

        let text = describe_move_report(&report);
        assert!(text.starts_with("Moved **2** of **3** members in 300 ms (1 pass)."));
        assert!(text.contains("• <@1>: Missing Permissions"));
        assert!(!text.contains("kept refilling"));
        assert!(!text.contains("lost track"));
    }

    #[test]
    fn test_describe_interrupted_report() {
        let mut report = MoveReport {
            passes: 1,
            interrupted: true,
            ..Default::default()
        };
        report.moved.insert(UserId::new(1));

        let text = describe_move_report(&report);
        assert!(text.starts_with("Moved **1** of **1** members"));
        assert!(text.contains("lost track of the raid channel"));
    }

    #[test]
    fn test_describe_exhausted_report_truncates_failures() {
        let mut report = MoveReport {
            passes: 5,
            exhausted: true,
            ..Default::default()
        };
        for id in 1..=12 {
            report.failures.insert(UserId::new(id), "timed out".to_string());
        }

        let text = describe_move_report(&report);
        assert!(text.contains("(5 passes)"));
        assert!(text.contains("kept refilling"));
        assert!(text.contains("...and 2 more"));
    }
}
