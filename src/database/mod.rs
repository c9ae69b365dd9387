// Credential store: the user table behind a small query interface.

pub mod memory;
pub mod repositories;

use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;

pub use memory::MemoryUserStore;
pub use repositories::user::PgUserStore;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRecord {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    UniqueViolation,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts a user. A taken email yields `StoreError::UniqueViolation`.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;
}
