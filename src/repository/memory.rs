//! In-memory implementation of the repository traits.
//!
//! All state is held behind a single `RwLock` and lost on drop. Team creation
//! runs under one write guard, which makes it atomic with respect to every
//! other operation on the store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PullRequestRepository, TeamRepository, UserRepository};
use crate::db::DbError;
use crate::models::{PullRequest, Team, User};

#[derive(Debug, Default)]
struct StoreState {
    /// Keyed by user id; iteration order doubles as the member order.
    users: BTreeMap<String, User>,
    teams: BTreeSet<String>,
    pull_requests: BTreeMap<String, PullRequest>,
}

impl StoreState {
    fn members_of(&self, team_name: &str, active_only: bool) -> Vec<User> {
        self.users
            .values()
            .filter(|u| u.team_name == team_name && (!active_only || u.is_active))
            .cloned()
            .collect()
    }
}

/// In-memory store implementing [`UserRepository`], [`TeamRepository`] and
/// [`PullRequestRepository`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`DbError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DbError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let state = self.state.read().await;
        Ok(state.users.get(id).cloned())
    }

    async fn get_by_team(&self, team_name: &str) -> Result<Vec<User>, DbError> {
        let state = self.state.read().await;
        Ok(state.members_of(team_name, false))
    }

    async fn get_active_by_team(&self, team_name: &str) -> Result<Vec<User>, DbError> {
        let state = self.state.read().await;
        Ok(state.members_of(team_name, true))
    }

    async fn save(&self, user: &User) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        state.users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryStore {
    async fn create(&self, team: &Team) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        if state.teams.contains(&team.name) {
            return Err(DbError::Constraint(format!(
                "team {} already exists",
                team.name
            )));
        }

        state.teams.insert(team.name.clone());
        for member in &team.members {
            let mut member = member.clone();
            member.team_name = team.name.clone();
            state.users.insert(member.id.clone(), member);
        }

        Ok(())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DbError> {
        let state = self.state.read().await;
        if !state.teams.contains(name) {
            return Ok(None);
        }
        Ok(Some(Team {
            name: name.to_string(),
            members: state.members_of(name, false),
        }))
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<PullRequest>, DbError> {
        let state = self.state.read().await;
        Ok(state.pull_requests.get(id).cloned())
    }

    async fn save(&self, pr: &PullRequest) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        state.pull_requests.insert(pr.id.clone(), pr.clone());
        Ok(())
    }

    async fn get_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, DbError> {
        let state = self.state.read().await;
        let mut prs: Vec<PullRequest> = state
            .pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .cloned()
            .collect();
        prs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(prs)
    }

    async fn has_open_pull_requests(&self, user_ids: &[String]) -> Result<bool, DbError> {
        let state = self.state.read().await;
        Ok(state.pull_requests.values().filter(|pr| pr.is_open()).any(|pr| {
            user_ids
                .iter()
                .any(|id| pr.author_id == *id || pr.has_reviewer(id))
        }))
    }
}
