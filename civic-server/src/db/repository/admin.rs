//! Admin Repository

use super::{RepoError, RepoResult};
use shared::models::{Admin, AdminStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, email, role, status, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admin WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(admin)
}

#[cfg(test)]
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Admin>> {
    let admin =
        sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admin WHERE email = ?"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;
    Ok(admin)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert an administrator record
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    role: &str,
    status: AdminStatus,
) -> RepoResult<Admin> {
    let id = snowflake_id();
    let email = email.trim().to_lowercase();

    sqlx::query("INSERT INTO admin (id, name, email, role, status, created_at) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(id)
        .bind(name.trim())
        .bind(&email)
        .bind(role)
        .bind(status)
        .bind(now_millis())
        .execute(pool)
        .await
        .map_err(|e| RepoError::from(e).with_duplicate_value(|_| Some(email.clone())))?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create admin".into()))
}
