//! Derives unread-upload and completion state from an audit snapshot.
//!
//! Every function here is deterministic and side-effect-free: the same
//! snapshot always yields the same answer, so results can be safely
//! re-computed on every realtime update. Membership lookups fold folders
//! together by file name: a file previewed in one folder counts as seen
//! everywhere.

use std::collections::BTreeSet;

use projecthub_core::config::notifications::{CompletionMode, NotificationsConfig};
use projecthub_entity::audit::{AuditAction, AuditRecord};

/// How many distinct non-uploader actors complete a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// A fixed count, regardless of roster size.
    FixedThreshold(usize),
    /// Everyone on the roster except the uploader.
    AllOtherMembers,
}

impl CompletionPolicy {
    /// Derive the policy from configuration.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        match config.completion_mode {
            CompletionMode::FixedThreshold => Self::FixedThreshold(config.fixed_threshold),
            CompletionMode::AllOtherMembers => Self::AllOtherMembers,
        }
    }

    /// The threshold for a roster of the given size.
    pub fn threshold(&self, roster_size: usize) -> usize {
        match self {
            Self::FixedThreshold(n) => *n,
            Self::AllOtherMembers => roster_size.saturating_sub(1),
        }
    }
}

/// Derived completion state for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// All eligible members have previewed the subject.
    pub fully_viewed: bool,
    /// All eligible members have downloaded the subject.
    pub fully_downloaded: bool,
}

/// File names the viewer has previewed or downloaded, in any folder.
pub fn acted_files<'a>(records: &'a [AuditRecord], viewer: &str) -> BTreeSet<&'a str> {
    records
        .iter()
        .filter(|r| r.action.is_membership() && r.has_member(viewer))
        .filter_map(|r| r.subject_name.as_deref())
        .collect()
}

/// Upload records the viewer has not uploaded, previewed, or downloaded.
pub fn unread_uploads<'a>(records: &'a [AuditRecord], viewer: &str) -> Vec<&'a AuditRecord> {
    let seen = acted_files(records, viewer);
    records
        .iter()
        .filter(|r| r.action == AuditAction::Upload && r.actor != viewer)
        .filter(|r| {
            r.subject_name
                .as_deref()
                .map(|name| !seen.contains(name))
                .unwrap_or(false)
        })
        .collect()
}

/// Completion state of one file subject under the given policy.
pub fn completion(
    records: &[AuditRecord],
    file_name: &str,
    roster_size: usize,
    policy: CompletionPolicy,
) -> Completion {
    let uploader = uploader_of(records, file_name);
    let threshold = policy.threshold(roster_size);
    Completion {
        fully_viewed: distinct_actors(records, file_name, AuditAction::Preview, uploader)
            >= threshold,
        fully_downloaded: distinct_actors(records, file_name, AuditAction::Download, uploader)
            >= threshold,
    }
}

/// The original (earliest) uploader of a file, in any folder.
fn uploader_of<'a>(records: &'a [AuditRecord], file_name: &str) -> Option<&'a str> {
    records
        .iter()
        .filter(|r| r.action == AuditAction::Upload && r.subject_name.as_deref() == Some(file_name))
        .min_by_key(|r| r.acted_at)
        .map(|r| r.actor.as_str())
}

/// Count of distinct non-uploader members across all records of the
/// given action for a file.
fn distinct_actors(
    records: &[AuditRecord],
    file_name: &str,
    action: AuditAction,
    uploader: Option<&str>,
) -> usize {
    let members: BTreeSet<&str> = records
        .iter()
        .filter(|r| r.action == action && r.subject_name.as_deref() == Some(file_name))
        .flat_map(|r| r.members().iter().map(|m| m.username.as_str()))
        .filter(|username| Some(*username) != uploader)
        .collect();
    members.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use projecthub_entity::audit::Acknowledgement;
    use uuid::Uuid;

    fn record(
        project_id: Uuid,
        folder: &str,
        file_name: &str,
        action: AuditAction,
        actor: &str,
        at: DateTime<Utc>,
        members: &[&str],
    ) -> AuditRecord {
        let acks: Vec<Acknowledgement> = members
            .iter()
            .map(|m| Acknowledgement {
                username: m.to_string(),
                acked_at: at,
            })
            .collect();
        AuditRecord {
            id: Uuid::new_v4(),
            project_id,
            folder: Some(folder.to_string()),
            subject_name: Some(file_name.to_string()),
            action,
            actor: actor.to_string(),
            acted_at: at,
            viewed_by: if action == AuditAction::Preview {
                acks.clone()
            } else {
                Vec::new()
            },
            downloaded_by: if action == AuditAction::Download {
                acks
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn test_unread_excludes_uploader_and_seen() {
        let project_id = Uuid::new_v4();
        let now = Utc::now();
        let records = vec![
            record(project_id, "drawings", "report.pdf", AuditAction::Upload, "a", now, &[]),
            record(project_id, "drawings", "plan.pdf", AuditAction::Upload, "c", now, &[]),
            record(
                project_id,
                "drawings",
                "report.pdf",
                AuditAction::Preview,
                "b",
                now,
                &["b"],
            ),
        ];

        // `a` uploaded report.pdf, so only plan.pdf is unread for them.
        let for_a: Vec<_> = unread_uploads(&records, "a")
            .iter()
            .filter_map(|r| r.subject_name.as_deref())
            .collect();
        assert_eq!(for_a, vec!["plan.pdf"]);

        // `b` previewed report.pdf; plan.pdf remains.
        let for_b: Vec<_> = unread_uploads(&records, "b")
            .iter()
            .filter_map(|r| r.subject_name.as_deref())
            .collect();
        assert_eq!(for_b, vec!["plan.pdf"]);
    }

    #[test]
    fn test_preview_in_other_folder_counts_as_seen() {
        let project_id = Uuid::new_v4();
        let now = Utc::now();
        let records = vec![
            record(project_id, "drawings", "report.pdf", AuditAction::Upload, "a", now, &[]),
            record(
                project_id,
                "archive",
                "report.pdf",
                AuditAction::Preview,
                "b",
                now,
                &["b"],
            ),
        ];
        assert!(unread_uploads(&records, "b").is_empty());
    }

    #[test]
    fn test_completion_threshold_on_roster_of_six() {
        let project_id = Uuid::new_v4();
        let now = Utc::now();
        let policy = CompletionPolicy::FixedThreshold(5);
        let mut records = vec![record(
            project_id,
            "drawings",
            "report.pdf",
            AuditAction::Upload,
            "a",
            now,
            &[],
        )];

        // Four distinct non-uploader downloads: not complete yet.
        records.push(record(
            project_id,
            "drawings",
            "report.pdf",
            AuditAction::Download,
            "b",
            now,
            &["b", "c", "d", "e"],
        ));
        assert!(!completion(&records, "report.pdf", 6, policy).fully_downloaded);

        // The fifth flips it.
        records[1].downloaded_by.push(Acknowledgement {
            username: "f".to_string(),
            acked_at: now,
        });
        assert!(completion(&records, "report.pdf", 6, policy).fully_downloaded);

        // The uploader downloading their own file changes nothing.
        records[1].downloaded_by.push(Acknowledgement {
            username: "a".to_string(),
            acked_at: now,
        });
        assert!(completion(&records, "report.pdf", 6, policy).fully_downloaded);
    }

    #[test]
    fn test_completion_stable_under_duplicates() {
        let project_id = Uuid::new_v4();
        let now = Utc::now();
        let policy = CompletionPolicy::AllOtherMembers;
        let records = vec![
            record(project_id, "drawings", "spec.pdf", AuditAction::Upload, "a", now, &[]),
            record(
                project_id,
                "drawings",
                "spec.pdf",
                AuditAction::Preview,
                "b",
                now,
                &["b", "c"],
            ),
            // A second preview record in another folder repeats `b`.
            record(
                project_id,
                "archive",
                "spec.pdf",
                AuditAction::Preview,
                "b",
                now,
                &["b"],
            ),
        ];
        let result = completion(&records, "spec.pdf", 3, policy);
        assert!(result.fully_viewed);
        assert!(!result.fully_downloaded);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let project_id = Uuid::new_v4();
        let now = Utc::now();
        let records = vec![
            record(project_id, "drawings", "report.pdf", AuditAction::Upload, "a", now, &[]),
            record(
                project_id,
                "drawings",
                "report.pdf",
                AuditAction::Preview,
                "b",
                now,
                &["b", "c"],
            ),
        ];
        let first: Vec<_> = unread_uploads(&records, "d");
        let second: Vec<_> = unread_uploads(&records, "d");
        assert_eq!(first, second);
        assert_eq!(
            completion(&records, "report.pdf", 6, CompletionPolicy::FixedThreshold(5)),
            completion(&records, "report.pdf", 6, CompletionPolicy::FixedThreshold(5)),
        );
    }
}
