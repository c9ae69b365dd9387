use std::sync::Mutex;

use async_trait::async_trait;

use crate::database::{NewUser, StoreError, UserRecord, UserStore};

/// Process-local user store. Email uniqueness is checked under the same lock as the insert.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored row with this email.
    pub fn rows_with_email(&self, email: &str) -> Vec<UserRecord> {
        self.users
            .lock()
            .map(|users| users.iter().filter(|u| u.email == email).cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("user store lock poisoned".into()))
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation);
        }

        let record = UserRecord {
            user_id: users.len() as i32 + 1,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };
        users.push(record.clone());
        Ok(record)
    }
}
