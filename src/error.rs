//! Application error types.
//!
//! Every domain-rule violation maps to exactly one variant so the HTTP layer
//! can translate it into a status and error code. Repository failures collapse
//! into [`AppError::Database`] and are never confused with a "not found".

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by services and the HTTP layer.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Referenced user id does not exist.
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    /// No team with this name.
    #[error("Team not found: {team_name}")]
    TeamNotFound { team_name: String },

    /// No pull request with this id.
    #[error("Pull request not found: {pr_id}")]
    PullRequestNotFound { pr_id: String },

    /// Pull request id collision on create.
    #[error("Pull request already exists: {pr_id}")]
    PullRequestExists { pr_id: String },

    /// Team name collision on create.
    #[error("Team already exists: {team_name}")]
    TeamExists { team_name: String },

    /// Reassignment attempted on a merged pull request.
    #[error("Pull request already merged: {pr_id}")]
    PullRequestMerged { pr_id: String },

    /// The given user is not currently a reviewer on the pull request.
    #[error("User {user_id} is not assigned to pull request {pr_id}")]
    ReviewerNotAssigned { pr_id: String, user_id: String },

    /// The reviewer's team has no eligible active substitute.
    #[error("No active replacement candidate for pull request {pr_id}")]
    NoReplacementCandidate { pr_id: String },

    /// A proposed team member has open review work.
    #[error("Some users have open pull requests")]
    UserHasOpenPullRequests {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        user_ids: Vec<String>,
    },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn team_not_found(team_name: impl Into<String>) -> Self {
        Self::TeamNotFound {
            team_name: team_name.into(),
        }
    }

    pub fn pull_request_not_found(pr_id: impl Into<String>) -> Self {
        Self::PullRequestNotFound {
            pr_id: pr_id.into(),
        }
    }

    pub fn pull_request_exists(pr_id: impl Into<String>) -> Self {
        Self::PullRequestExists {
            pr_id: pr_id.into(),
        }
    }

    pub fn team_exists(team_name: impl Into<String>) -> Self {
        Self::TeamExists {
            team_name: team_name.into(),
        }
    }

    pub fn pull_request_merged(pr_id: impl Into<String>) -> Self {
        Self::PullRequestMerged {
            pr_id: pr_id.into(),
        }
    }

    pub fn reviewer_not_assigned(pr_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::ReviewerNotAssigned {
            pr_id: pr_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn no_replacement_candidate(pr_id: impl Into<String>) -> Self {
        Self::NoReplacementCandidate {
            pr_id: pr_id.into(),
        }
    }

    /// Create an open-work guard error for the given proposed member ids.
    pub fn user_has_open_pull_requests(user_ids: Vec<String>) -> Self {
        Self::UserHasOpenPullRequests { user_ids }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is a domain-rule violation rather than an
    /// infrastructure failure.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Database { .. } | Self::Internal { .. })
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        match err {
            crate::db::DbError::Migration(_) => Self::database_with_op(err.to_string(), "migrate"),
            _ => Self::database(err.to_string()),
        }
    }
}
