// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{error::AppError, store::storage::Storage};

/// [`Storage`] backed by the `records` table (see `migrations/`).
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, AppError> {
        let payload = sqlx::query_scalar::<_, String>(
            "SELECT payload FROM records WHERE namespace = $1 AND key = $2",
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read record {}/{}: {:?}", namespace, key, e);
            AppError::from(e)
        })?;

        Ok(payload)
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO records (namespace, key, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (namespace, key) DO UPDATE SET
                payload = EXCLUDED.payload,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write record {}/{}: {:?}", namespace, key, e);
            AppError::from(e)
        })?;

        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM records WHERE namespace = $1 AND key = $2")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete record {}/{}: {:?}", namespace, key, e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<String>, AppError> {
        let payloads = sqlx::query_scalar::<_, String>(
            "SELECT payload FROM records WHERE namespace = $1 ORDER BY seq",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list records in {}: {:?}", namespace, e);
            AppError::from(e)
        })?;

        Ok(payloads)
    }
}
