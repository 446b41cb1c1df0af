//! Caller identity.
//!
//! Authentication happens upstream; by the time a request reaches this
//! backend the gateway has already established who is calling. Handlers and
//! the executor only consume the resulting identity and role.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Admin,
    User,
}

impl ActorRole {
    /// Parse a role from its wire form. Unknown values fall back to `User`
    /// so a misconfigured gateway can never grant admin by accident.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "admin" => ActorRole::Admin,
            _ => ActorRole::User,
        }
    }
}

/// An authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}
