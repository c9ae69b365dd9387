use thiserror::Error;

/// Work factor used for stored password hashes.
pub const PASSWORD_HASH_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Salted bcrypt hashing. Work runs on the blocking pool so handlers stay responsive.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: PASSWORD_HASH_COST,
        }
    }
}

impl PasswordHasher {
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
            .await??;
        Ok(hashed)
    }

    /// Returns `Ok(false)` on mismatch. Errors only when the stored hash is malformed.
    pub async fn verify(&self, password: &str, hashed: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hashed = hashed.to_owned();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &hashed))
                .await??;
        Ok(matches)
    }
}
