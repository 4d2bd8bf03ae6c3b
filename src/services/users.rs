//! User directory service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Role, User},
    repository::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn UserStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<User>> {
        actor.require_manage_users()?;
        self.store.list().await
    }

    /// Change another user's role. Takes effect on that user's next request
    /// since capabilities are derived from the role each time.
    pub async fn update_role(&self, actor: &Actor, target_id: &str, role: Role) -> AppResult<User> {
        actor.require_manage_users()?;

        if actor.user_id == target_id {
            return Err(AppError::InvalidState("You cannot change your own role.".to_string()));
        }

        let user = self.store.set_role(target_id, role).await?;
        tracing::info!(
            user_id = %target_id,
            role = role.as_str(),
            changed_by = %actor.user_id,
            "User role updated"
        );
        Ok(user)
    }
}
