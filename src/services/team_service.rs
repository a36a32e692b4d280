//! Team creation and lookup.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Team, User};
use crate::repository::{PullRequestRepository, TeamRepository};

/// Creates teams, refusing members who still have open review work.
#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    pull_requests: Arc<dyn PullRequestRepository>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamRepository>, pull_requests: Arc<dyn PullRequestRepository>) -> Self {
        Self {
            teams,
            pull_requests,
        }
    }

    /// Create a team together with its members.
    ///
    /// Fails with `TeamExists` on a name collision and with
    /// `UserHasOpenPullRequests` if any member authors or reviews an open
    /// pull request. The team row and every member upsert are written as one
    /// atomic unit by the repository.
    pub async fn create_team(&self, name: &str, members: Vec<User>) -> Result<Team, AppError> {
        if self.teams.get_by_name(name).await?.is_some() {
            log::warn!("[teams] Rejected duplicate team {}", name);
            return Err(AppError::team_exists(name));
        }

        let team = Team::new(name, members);
        let member_ids = team.member_ids();

        if self.pull_requests.has_open_pull_requests(&member_ids).await? {
            let blocked = self.members_with_open_work(member_ids).await?;
            log::warn!(
                "[teams] Rejected team {}: members {:?} have open pull requests",
                name,
                blocked
            );
            return Err(AppError::user_has_open_pull_requests(blocked));
        }

        self.teams.create(&team).await?;

        log::info!("[teams] Created team {} with {} members", team.name, team.members.len());
        Ok(team)
    }

    /// Narrow `member_ids` down to those that author or review an open pull request.
    async fn members_with_open_work(
        &self,
        member_ids: Vec<String>,
    ) -> Result<Vec<String>, AppError> {
        let mut blocked = Vec::new();
        for id in member_ids {
            if self
                .pull_requests
                .has_open_pull_requests(std::slice::from_ref(&id))
                .await?
            {
                blocked.push(id);
            }
        }
        Ok(blocked)
    }

    pub async fn get_team(&self, name: &str) -> Result<Team, AppError> {
        log::debug!("[teams] Looking up team {}", name);
        self.teams
            .get_by_name(name)
            .await?
            .ok_or_else(|| AppError::team_not_found(name))
    }
}
