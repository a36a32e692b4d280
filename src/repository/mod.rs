//! Repository abstraction for users, teams and pull requests.
//!
//! The services depend only on these traits, so storage backends are
//! swappable: [`SqliteStore`] for the server, [`InMemoryStore`] for tests.
//! A lookup that finds nothing returns `Ok(None)`; `Err` is reserved for
//! storage failures.

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::db::DbError;
use crate::models::{PullRequest, Team, User};

/// Storage of users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by id, returning None if not found.
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, DbError>;

    /// All members of a team, ordered by user id.
    async fn get_by_team(&self, team_name: &str) -> Result<Vec<User>, DbError>;

    /// Active members of a team, ordered by user id.
    async fn get_active_by_team(&self, team_name: &str) -> Result<Vec<User>, DbError>;

    /// Store a user (upsert by id).
    async fn save(&self, user: &User) -> Result<(), DbError>;
}

/// Storage of teams.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create the team and upsert every member as one atomic unit.
    ///
    /// Either the team row and all member rows are written, or nothing is.
    async fn create(&self, team: &Team) -> Result<(), DbError>;

    /// Get a team with its members populated, returning None if not found.
    async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DbError>;
}

/// Storage of pull requests and their reviewer assignments.
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    /// Get a pull request with reviewers in assignment order, returning None
    /// if not found.
    async fn get_by_id(&self, id: &str) -> Result<Option<PullRequest>, DbError>;

    /// Store a pull request (upsert by id), replacing its whole reviewer set.
    async fn save(&self, pr: &PullRequest) -> Result<(), DbError>;

    /// All pull requests, open or merged, on which `user_id` is a reviewer.
    async fn get_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, DbError>;

    /// Whether any of `user_ids` authored, or reviews, an open pull request.
    async fn has_open_pull_requests(&self, user_ids: &[String]) -> Result<bool, DbError>;
}
