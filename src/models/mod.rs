//! Data models for the application.
//!
//! These models represent the core entities stored in SQLite and carried
//! through the services. `User` derives `FromRow` directly; pull requests are
//! assembled from their row plus the reviewer table.

pub mod pull_request;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestStatus, MAX_REVIEWERS};
pub use team::Team;
pub use user::User;
