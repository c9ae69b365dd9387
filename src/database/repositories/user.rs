use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;

use crate::database::{NewUser, StoreError, UserRecord, UserStore};

/// SQLSTATE raised by Postgres on a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'chart_backend';")
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Creates the `users` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id  SERIAL PRIMARY KEY,
                name     TEXT NOT NULL,
                email    TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT user_id, name, email, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        // Conditional insert: a concurrent signup for the same email gets no row back.
        let result = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING user_id, name, email, password
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(created)) => {
                tracing::debug!("Inserted user {}", created.user_id);
                Ok(created)
            }
            Ok(None) => Err(StoreError::UniqueViolation),
            Err(e) if is_unique_violation(&e) => Err(StoreError::UniqueViolation),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.code().as_deref() == Some(UNIQUE_VIOLATION)
        }
        _ => false,
    }
}
