//! User model, capabilities and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::Role;
use crate::error::AppError;

/// Capabilities derived from a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CapabilitySet {
    pub manage_inventory: bool,
    pub manage_users: bool,
    pub check_out_for_others: bool,
    pub see_admin_stats: bool,
}

/// Pure projection of a role onto its capabilities.
pub fn capabilities(role: Role) -> CapabilitySet {
    let elevated = matches!(role, Role::Admin | Role::SuperAdmin);
    CapabilitySet {
        manage_inventory: elevated,
        manage_users: role == Role::SuperAdmin,
        check_out_for_others: elevated,
        see_admin_stats: elevated,
    }
}

/// The user performing an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Directory id of the user
    pub user_id: String,
    /// Holder identity written to `assigned_to`
    pub identity: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, identity: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            identity: identity.into(),
            role,
        }
    }

    /// Computed on every call so a role change takes effect immediately
    pub fn capabilities(&self) -> CapabilitySet {
        capabilities(self.role)
    }

    pub fn require_manage_inventory(&self) -> Result<(), AppError> {
        if self.capabilities().manage_inventory {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Insufficient rights to manage inventory".to_string(),
            ))
        }
    }

    pub fn require_manage_users(&self) -> Result<(), AppError> {
        if self.capabilities().manage_users {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Insufficient rights to manage users".to_string(),
            ))
        }
    }
}

/// User directory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub employee_id: Option<String>,
    pub role: Role,
    pub last_updated: DateTime<Utc>,
}

/// Update role request (super admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRole {
    pub role: Role,
}

/// JWT claims issued by the external authentication service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: String,
    /// Display name, used as the holder identity
    pub name: String,
    /// Role string; unknown values are treated as `normal`
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.sub.clone(), self.name.clone(), Role::from(self.role.as_str()))
    }
}
