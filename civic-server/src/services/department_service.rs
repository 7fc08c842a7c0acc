//! Department registry service

use crate::cache::TtlCache;
use crate::db::repository::RepoError;
use crate::db::repository::department::{self, DepartmentFilter};
use shared::models::{Department, DepartmentCreate, DepartmentUpdate};
use shared::request::PageRequest;
use shared::response::Page;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;
use validator::Validate;

fn cache_key(id: i64) -> String {
    format!("department:{id}")
}

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::DepartmentNotFound, format!("Department {id} not found"))
}

fn repo_error(id: i64, err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(_) => not_found(id),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct DepartmentService {
    pool: SqlitePool,
    cache: Option<TtlCache>,
}

impl DepartmentService {
    pub fn new(pool: SqlitePool, cache: Option<TtlCache>) -> Self {
        Self { pool, cache }
    }

    pub async fn list(
        &self,
        filter: &DepartmentFilter,
        page: PageRequest,
    ) -> AppResult<Page<Department>> {
        let (items, total) = department::list(&self.pool, filter, page).await?;
        Ok(Page::new(items, page.page, page.limit, total))
    }

    pub async fn get(&self, id: i64) -> AppResult<Department> {
        let key = cache_key(id);
        let generation = match &self.cache {
            Some(cache) => {
                if let Some(cached) = cache.get_json::<Department>(&key) {
                    return Ok(cached);
                }
                cache.generation(&key)
            }
            None => 0,
        };

        let department = department::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        // An update or deactivate that landed during the read wins
        if let Some(cache) = &self.cache {
            cache.set_json_if_current(key, generation, &department);
        }
        Ok(department)
    }

    pub async fn create(&self, data: DepartmentCreate) -> AppResult<Department> {
        let data = data.normalize();
        data.validate()?;

        let department = department::create(&self.pool, data).await?;
        tracing::info!(
            department_id = department.id,
            code = %department.code,
            "Department created"
        );
        Ok(department)
    }

    /// Partial update; an empty payload returns the record unchanged
    pub async fn update(&self, id: i64, data: DepartmentUpdate) -> AppResult<Department> {
        let data = data.normalize();
        data.validate()?;

        if data.is_empty() {
            return self.get(id).await;
        }

        let department = department::update(&self.pool, id, data)
            .await
            .map_err(|e| repo_error(id, e))?;
        self.invalidate(id);
        tracing::info!(department_id = id, "Department updated");
        Ok(department)
    }

    /// Soft delete
    pub async fn deactivate(&self, id: i64) -> AppResult<Department> {
        let department = department::deactivate(&self.pool, id)
            .await
            .map_err(|e| repo_error(id, e))?;
        self.invalidate(id);
        tracing::info!(department_id = id, "Department deactivated");
        Ok(department)
    }

    /// Department bound to a `department`-role account
    pub async fn find_by_account(&self, account_id: &str) -> AppResult<Option<Department>> {
        Ok(department::find_by_account_id(&self.pool, account_id).await?)
    }

    fn invalidate(&self, id: i64) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&cache_key(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use std::time::Duration;

    async fn service() -> DepartmentService {
        let db = DbService::in_memory().await.unwrap();
        DepartmentService::new(db.pool, Some(TtlCache::new(Duration::from_secs(60))))
    }

    fn payload() -> DepartmentCreate {
        serde_json::from_value(serde_json::json!({
            "name": "  Roads  ",
            "code": " roads ",
            "contact_email": "Roads@City.GOV",
            "categories": ["roads", "lighting"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_normalizes() {
        let service = service().await;
        let created = service.create(payload()).await.unwrap();
        assert_eq!(created.name, "Roads");
        assert_eq!(created.code, "ROADS");
        assert_eq!(created.contact_email, "roads@city.gov");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let service = service().await;
        let mut data = payload();
        data.contact_email = "not-an-email".into();
        data.priority = Some(9);

        let err = service.create(data).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"contact_email"));
        assert!(fields.contains(&"priority"));
    }

    #[tokio::test]
    async fn test_update_invalidates_cached_read() {
        let service = service().await;
        let created = service.create(payload()).await.unwrap();
        assert_eq!(service.get(created.id).await.unwrap().priority, 3);

        service
            .update(
                created.id,
                DepartmentUpdate {
                    priority: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(service.get(created.id).await.unwrap().priority, 5);
    }

    #[tokio::test]
    async fn test_deactivate_during_read_is_not_masked_by_cache() {
        let service = service().await;
        let created = service.create(payload()).await.unwrap();
        let cache = service.cache.clone().unwrap();
        let key = cache_key(created.id);

        // A reader captured the generation and fetched the active row, then
        // the deactivate committed before the reader filled the cache
        let seen = cache.generation(&key);
        let snapshot = department::find_by_id(&service.pool, created.id)
            .await
            .unwrap()
            .unwrap();
        service.deactivate(created.id).await.unwrap();
        assert!(!cache.set_json_if_current(key, seen, &snapshot));

        assert!(!service.get(created.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_blank_description_keeps_stored_value() {
        let service = service().await;
        let created = service.create(payload()).await.unwrap();
        let update = |text: &str| DepartmentUpdate {
            description: Some(text.into()),
            ..Default::default()
        };

        service.update(created.id, update("Potholes")).await.unwrap();
        let kept = service.update(created.id, update("   ")).await.unwrap();
        assert_eq!(kept.description.as_deref(), Some("Potholes"));
    }

    #[tokio::test]
    async fn test_empty_update_returns_current_record() {
        let service = service().await;
        let created = service.create(payload()).await.unwrap();
        let same = service
            .update(created.id, DepartmentUpdate::default())
            .await
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn test_missing_department() {
        let service = service().await;
        assert_eq!(
            service.get(42).await.unwrap_err().code,
            ErrorCode::DepartmentNotFound
        );
        assert_eq!(
            service.deactivate(42).await.unwrap_err().code,
            ErrorCode::DepartmentNotFound
        );
    }
}
