use std::sync::Arc;
use std::time::Duration;

use crate::auth::{LoginRequest, PublicUser, SignupRequest};
use crate::database::{NewUser, StoreError, UserStore};
use crate::error::AppError;
use crate::utils::{Claims, PasswordHasher, TokenService};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
    token_ttl: Duration,
}

/// Treats absent and empty strings alike.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            token_ttl,
        }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<PublicUser, AppError> {
        let (Some(name), Some(email), Some(password)) = (
            present(req.name),
            present(req.email),
            present(req.password),
        ) else {
            return Err(AppError::Validation);
        };

        if self.users.find_by_email(&email).await?.is_some() {
            tracing::info!("Signup rejected, email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&password).await?;

        // The insert is the authority on uniqueness: a concurrent signup may have
        // claimed the email since the lookup above.
        let user = self
            .users
            .insert(NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::UniqueViolation) {
                    tracing::info!("Signup lost insert race on email uniqueness");
                }
                AppError::from(e)
            })?;

        tracing::info!("Registered user {}", user.user_id);
        Ok(user.into())
    }

    /// Returns a signed session token on success.
    pub async fn login(&self, req: LoginRequest) -> Result<String, AppError> {
        let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
            return Err(AppError::Validation);
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(&password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.user_id, &user.email, self.token_ttl)?;
        tracing::info!("User {} logged in", user.user_id);

        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify(token).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AppError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures_util::future::join_all;

    use super::*;
    use crate::database::{MemoryUserStore, UserRecord};

    const TEN_DAYS: Duration = Duration::from_secs(10 * 24 * 60 * 60);

    fn service_with(users: Arc<dyn UserStore>) -> AuthService {
        AuthService::new(
            users,
            PasswordHasher::with_cost(4 /* bcrypt minimum cost */),
            TokenService::new("test-secret").unwrap(),
            TEN_DAYS,
        )
    }

    fn signup_req(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    /// Lookup never sees the row; the insert reports the conflict.
    struct RacingStore;

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>, StoreError> {
            Ok(None)
        }

        async fn insert(&self, _user: NewUser) -> Result<UserRecord, StoreError> {
            Err(StoreError::UniqueViolation)
        }
    }

    struct DownStore;

    #[async_trait]
    impl UserStore for DownStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn insert(&self, _user: NewUser) -> Result<UserRecord, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn signup_then_login_scenario() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service_with(store.clone());

        let user = auth
            .signup(signup_req("Ana", "a@x.com", "pw123456"))
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "Ana");

        let again = auth.signup(signup_req("Ana", "a@x.com", "pw123456")).await;
        assert!(matches!(again, Err(AppError::DuplicateEmail)));

        let token = auth.login(login_req("a@x.com", "pw123456")).await.unwrap();
        assert!(!token.is_empty());
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, "a@x.com");

        let wrong = auth.login(login_req("a@x.com", "nope")).await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn stored_hash_is_not_plaintext_and_verifies() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service_with(store.clone());
        auth.signup(signup_req("Ana", "a@x.com", "pw123456"))
            .await
            .unwrap();

        let rows = store.rows_with_email("a@x.com");
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0].password_hash, "pw123456");
        assert!(bcrypt::verify("pw123456", &rows[0].password_hash).unwrap());
    }

    #[tokio::test]
    async fn missing_or_empty_fields_are_validation_errors() {
        let auth = service_with(Arc::new(MemoryUserStore::new()));

        let cases = [
            SignupRequest::default(),
            SignupRequest {
                name: None,
                ..signup_req("Ana", "a@x.com", "pw")
            },
            signup_req("Ana", "", "pw"),
            signup_req("Ana", "a@x.com", ""),
        ];
        for req in cases {
            assert!(matches!(auth.signup(req).await, Err(AppError::Validation)));
        }

        let login = auth
            .login(LoginRequest {
                email: Some("a@x.com".into()),
                password: None,
            })
            .await;
        assert!(matches!(login, Err(AppError::Validation)));
    }

    #[tokio::test]
    async fn concurrent_duplicate_signups_store_one_row() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service_with(store.clone());

        let results = join_all(
            (0..6).map(|i| auth.signup(signup_req(&format!("Ana {i}"), "a@x.com", "pw123456"))),
        )
        .await;

        let created = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::DuplicateEmail)))
            .count();
        assert_eq!(created, 1);
        assert_eq!(duplicates, 5);
        assert_eq!(store.rows_with_email("a@x.com").len(), 1);
    }

    #[tokio::test]
    async fn insert_conflict_is_reported_as_duplicate() {
        let auth = service_with(Arc::new(RacingStore));
        let result = auth.signup(signup_req("Ana", "a@x.com", "pw123456")).await;
        assert!(matches!(result, Err(AppError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let auth = service_with(Arc::new(DownStore));

        let signup = auth.signup(signup_req("Ana", "a@x.com", "pw123456")).await;
        assert!(matches!(signup, Err(AppError::Internal(_))));

        let login = auth.login(login_req("a@x.com", "pw123456")).await;
        assert!(matches!(login, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let auth = service_with(Arc::new(MemoryUserStore::new()));
        auth.signup(signup_req("Ana", "a@x.com", "pw123456"))
            .await
            .unwrap();

        let unknown = auth
            .login(login_req("nobody@x.com", "pw123456"))
            .await
            .unwrap_err();
        let wrong = auth.login(login_req("a@x.com", "wrong")).await.unwrap_err();

        assert_eq!(unknown.status(), wrong.status());
        assert_eq!(unknown.public_message(), wrong.public_message());
        assert_eq!(wrong.public_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_internal() {
        let store = Arc::new(MemoryUserStore::new());
        store
            .insert(NewUser {
                name: "Ana".into(),
                email: "a@x.com".into(),
                password_hash: "plaintext-by-mistake".into(),
            })
            .await
            .unwrap();
        let auth = service_with(store);

        let result = auth.login(login_req("a@x.com", "pw123456")).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn token_signed_elsewhere_is_invalid() {
        let auth = service_with(Arc::new(MemoryUserStore::new()));
        let foreign = TokenService::new("other-secret")
            .unwrap()
            .issue(1, "a@x.com", TEN_DAYS)
            .unwrap();

        assert!(matches!(auth.verify_token(&foreign), Err(AppError::InvalidToken)));
    }
}
