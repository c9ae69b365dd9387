//! Signup and login workflows.
//!
//! Orchestrates the credential store, password hashing and token issuance. Callers
//! only ever see public user fields and the taxonomy in [`crate::error::AppError`].

mod service;

use serde::{Deserialize, Serialize};

use crate::database::UserRecord;

pub use service::AuthService;

/// Signup body. Fields are optional so absent ones surface as validation errors.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User fields safe to return to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<UserRecord> for PublicUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.user_id,
            name: user.name,
            email: user.email,
        }
    }
}
