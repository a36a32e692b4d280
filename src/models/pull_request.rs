//! Pull request model and its state transitions.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of reviewers assigned to a pull request.
pub const MAX_REVIEWERS: usize = 2;

/// State of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    /// Parse the stored representation. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "MERGED" => Some(Self::Merged),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current time at the precision storage keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A pull request with its assigned reviewers.
///
/// `merged_at` is set exactly when `status` is `Merged`; the author never
/// appears in `assigned_reviewers`, which holds at most [`MAX_REVIEWERS`]
/// distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: PullRequestStatus,

    /// Reviewer user ids in assignment order.
    pub assigned_reviewers: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Create an open pull request with no reviewers.
    pub fn new(id: impl Into<String>, name: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            assigned_reviewers: Vec::new(),
            created_at: now(),
            merged_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PullRequestStatus::Open
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    /// Transition to `Merged`. Repeated calls leave `merged_at` untouched.
    pub fn merge(&mut self) {
        if self.is_merged() {
            return;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(now());
    }

    /// Overwrite the slot holding `old` with `new`, keeping its position.
    ///
    /// No-op when `old` is not assigned.
    pub fn replace_reviewer(&mut self, old: &str, new: impl Into<String>) {
        if let Some(slot) = self.assigned_reviewers.iter_mut().find(|r| *r == old) {
            *slot = new.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr_with_reviewers(reviewers: &[&str]) -> PullRequest {
        let mut pr = PullRequest::new("pr-1", "Add feature", "author");
        pr.assigned_reviewers = reviewers.iter().map(|r| r.to_string()).collect();
        pr
    }

    #[test]
    fn test_new_is_open_without_reviewers() {
        let pr = PullRequest::new("pr-1", "Add feature", "author");
        assert!(pr.is_open());
        assert!(pr.assigned_reviewers.is_empty());
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn test_merge_sets_timestamp() {
        let mut pr = pr_with_reviewers(&["b"]);
        pr.merge();

        assert!(pr.is_merged());
        let merged_at = pr.merged_at.expect("merged_at should be set");
        assert!(merged_at >= pr.created_at);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut pr = pr_with_reviewers(&["b", "c"]);
        pr.merge();
        let first = pr.clone();

        std::thread::sleep(std::time::Duration::from_millis(5));
        pr.merge();

        assert_eq!(pr, first);
    }

    #[test]
    fn test_replace_reviewer_preserves_position() {
        let mut pr = pr_with_reviewers(&["b", "c"]);
        pr.replace_reviewer("b", "d");
        assert_eq!(pr.assigned_reviewers, vec!["d", "c"]);

        pr.replace_reviewer("c", "e");
        assert_eq!(pr.assigned_reviewers, vec!["d", "e"]);
    }

    #[test]
    fn test_replace_missing_reviewer_is_noop() {
        let mut pr = pr_with_reviewers(&["b", "c"]);
        pr.replace_reviewer("x", "d");
        assert_eq!(pr.assigned_reviewers, vec!["b", "c"]);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(PullRequestStatus::parse("OPEN"), Some(PullRequestStatus::Open));
        assert_eq!(PullRequestStatus::parse("MERGED"), Some(PullRequestStatus::Merged));
        assert_eq!(PullRequestStatus::parse("merged"), None);
        assert_eq!(PullRequestStatus::Merged.to_string(), "MERGED");
    }

    #[test]
    fn test_now_has_millisecond_precision() {
        assert_eq!(now().timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
