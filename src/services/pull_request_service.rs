//! Pull request lifecycle and reviewer assignment.
//!
//! Reviewers are drawn from the active members of a team. Creation takes a
//! random permutation of the author's teammates and keeps the first
//! [`MAX_REVIEWERS`]; reassignment swaps one reviewer for a random teammate of
//! that reviewer who is not already on the pull request.

use std::sync::Arc;

use super::random::RandomSource;
use crate::error::AppError;
use crate::models::{PullRequest, MAX_REVIEWERS};
use crate::repository::{PullRequestRepository, UserRepository};

/// Outcome of a successful reassignment.
#[derive(Debug, Clone)]
pub struct Reassignment {
    pub pull_request: PullRequest,
    /// Id of the reviewer who took over the slot.
    pub replaced_by: String,
}

#[derive(Clone)]
pub struct PullRequestService {
    pull_requests: Arc<dyn PullRequestRepository>,
    users: Arc<dyn UserRepository>,
    random: Arc<dyn RandomSource>,
}

impl PullRequestService {
    pub fn new(
        pull_requests: Arc<dyn PullRequestRepository>,
        users: Arc<dyn UserRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            pull_requests,
            users,
            random,
        }
    }

    /// Open a pull request and assign up to two random active teammates of
    /// the author. Fewer candidates simply means fewer reviewers.
    pub async fn create_pull_request(
        &self,
        id: &str,
        name: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        if self.pull_requests.get_by_id(id).await?.is_some() {
            log::warn!("[pull_requests] Rejected duplicate pull request {}", id);
            return Err(AppError::pull_request_exists(id));
        }

        let author = self
            .users
            .get_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(author_id))?;

        let mut candidates: Vec<String> = self
            .users
            .get_active_by_team(&author.team_name)
            .await?
            .into_iter()
            .map(|u| u.id)
            .filter(|id| *id != author.id)
            .collect();

        self.random.shuffle(&mut candidates);
        candidates.truncate(MAX_REVIEWERS);

        let mut pr = PullRequest::new(id, name, author_id);
        pr.assigned_reviewers = candidates;

        self.pull_requests.save(&pr).await?;

        log::info!(
            "[pull_requests] Created {} by {} with reviewers {:?}",
            pr.id,
            pr.author_id,
            pr.assigned_reviewers
        );
        Ok(pr)
    }

    /// Mark a pull request merged. Merging twice is not an error and keeps
    /// the original `merged_at`.
    pub async fn merge(&self, id: &str) -> Result<PullRequest, AppError> {
        let mut pr = self
            .pull_requests
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::pull_request_not_found(id))?;

        let was_open = pr.is_open();
        pr.merge();
        self.pull_requests.save(&pr).await?;

        if was_open {
            log::info!("[pull_requests] Merged {}", pr.id);
        } else {
            log::debug!("[pull_requests] {} was already merged", pr.id);
        }
        Ok(pr)
    }

    /// Replace `old_reviewer_id` with a random active teammate of theirs,
    /// keeping the slot position. The author and reviewers already on the
    /// pull request are never candidates.
    pub async fn reassign_reviewer(
        &self,
        id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        let mut pr = self
            .pull_requests
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::pull_request_not_found(id))?;

        if pr.is_merged() {
            log::warn!("[pull_requests] Rejected reassignment on merged {}", id);
            return Err(AppError::pull_request_merged(id));
        }

        if !pr.has_reviewer(old_reviewer_id) {
            return Err(AppError::reviewer_not_assigned(id, old_reviewer_id));
        }

        let old_reviewer = self
            .users
            .get_by_id(old_reviewer_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(old_reviewer_id))?;

        let candidates: Vec<String> = self
            .users
            .get_active_by_team(&old_reviewer.team_name)
            .await?
            .into_iter()
            .map(|u| u.id)
            .filter(|uid| {
                uid != old_reviewer_id && *uid != pr.author_id && !pr.has_reviewer(uid)
            })
            .collect();

        if candidates.is_empty() {
            log::warn!(
                "[pull_requests] No replacement for {} on {} in team {}",
                old_reviewer_id,
                id,
                old_reviewer.team_name
            );
            return Err(AppError::no_replacement_candidate(id));
        }

        let replaced_by = candidates[self.random.pick_index(candidates.len())].clone();
        pr.replace_reviewer(old_reviewer_id, replaced_by.clone());
        self.pull_requests.save(&pr).await?;

        log::info!(
            "[pull_requests] Reassigned {} on {} to {}",
            old_reviewer_id,
            pr.id,
            replaced_by
        );
        Ok(Reassignment {
            pull_request: pr,
            replaced_by,
        })
    }

    /// Pull requests, open or merged, currently assigned to `user_id`.
    pub async fn get_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, AppError> {
        log::debug!("[pull_requests] Listing reviews for {}", user_id);
        Ok(self.pull_requests.get_by_reviewer(user_id).await?)
    }
}
