use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Client,
    Provider,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
            UserRole::Provider => "provider",
        }
    }

    pub fn from_str(value: &str) -> Option<UserRole> {
        match value {
            "admin" => Some(UserRole::Admin),
            "client" => Some(UserRole::Client),
            "provider" => Some(UserRole::Provider),
            _ => None,
        }
    }
}

/// Caller identity resolved by the auth middleware from a request credential.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}
