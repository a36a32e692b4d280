//! Business logic services.
//!
//! Each inbound request maps to exactly one service call. Services read
//! entities through the repository traits, apply the assignment and state
//! rules in memory, and write back through the same repositories.
//!
//! Services are independent of the HTTP layer and of any storage backend.

pub mod pull_request_service;
pub mod random;
pub mod team_service;
pub mod user_service;

pub use pull_request_service::{PullRequestService, Reassignment};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use team_service::TeamService;
pub use user_service::UserService;
