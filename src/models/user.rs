//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member who can author and review pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,

    /// Name of the team the user belongs to.
    pub team_name: String,

    /// Only active users are eligible for reviewer assignment.
    pub is_active: bool,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
        }
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
