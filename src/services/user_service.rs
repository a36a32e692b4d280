//! User activation.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;
use crate::repository::UserRepository;

/// Toggles whether a user is eligible for reviewer assignment.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Set `is_active` on a user and persist it.
    ///
    /// Pull requests the user reviews are left untouched; deactivating a
    /// reviewer does not trigger reassignment.
    pub async fn set_is_active(&self, user_id: &str, active: bool) -> Result<User, AppError> {
        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;

        if active {
            user.activate();
        } else {
            user.deactivate();
        }

        self.users.save(&user).await?;

        log::info!("[users] Set {} active={}", user.id, user.is_active);
        Ok(user)
    }
}
