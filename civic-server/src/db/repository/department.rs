//! Department Repository

use super::{RepoError, RepoResult, like_pattern};
use shared::models::{
    DEFAULT_PRIORITY, Department, DepartmentCreate, DepartmentUpdate, Location, ResponseTime,
    WorkingHours,
};
use shared::request::PageRequest;
use shared::util::{now_millis, snowflake_id};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const COLUMNS: &str = "id, name, code, description, contact_email, contact_phone, categories, \
                       priority, response_time, working_hours, location, account_id, is_active, \
                       created_at, updated_at";

/// List filters, all optional
#[derive(Debug, Clone, Default)]
pub struct DepartmentFilter {
    pub is_active: Option<bool>,
    /// Exact membership in the category list
    pub category: Option<String>,
    /// Case-insensitive substring on name, code, description
    pub search: Option<String>,
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a DepartmentFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(department.categories) WHERE json_each.value = ")
            .push_bind(category.as_str())
            .push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(code) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// One page of departments ordered by name, plus the total match count
pub async fn list(
    pool: &SqlitePool,
    filter: &DepartmentFilter,
    page: PageRequest,
) -> RepoResult<(Vec<Department>, u64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM department");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM department"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY name ASC, id ASC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<Department>().fetch_all(pool).await?;

    Ok((items, total.max(0) as u64))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Department>> {
    let department =
        sqlx::query_as::<_, Department>(&format!("SELECT {COLUMNS} FROM department WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(department)
}

/// Department bound to a department-role account
pub async fn find_by_account_id(
    pool: &SqlitePool,
    account_id: &str,
) -> RepoResult<Option<Department>> {
    let department = sqlx::query_as::<_, Department>(&format!(
        "SELECT {COLUMNS} FROM department WHERE account_id = ? LIMIT 1"
    ))
    .bind(account_id)
    .fetch_optional(pool)
    .await?;
    Ok(department)
}

/// Insert a department; `data` must already be normalized and validated
pub async fn create(pool: &SqlitePool, data: DepartmentCreate) -> RepoResult<Department> {
    let now = now_millis();
    let response_time = data.response_time.unwrap_or_default();
    let working_hours = data.working_hours.clone().unwrap_or_default();
    let location = data.location.clone().unwrap_or_default();

    // Snowflake ids carry 12 random bits per millisecond; retry the rare clash
    let mut attempt = 0;
    let id = loop {
        let id = snowflake_id();
        let result = sqlx::query(
            "INSERT INTO department (id, name, code, description, contact_email, contact_phone, \
             categories, priority, response_time, working_hours, location, account_id, is_active, \
             created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.code)
        .bind(&data.description)
        .bind(&data.contact_email)
        .bind(&data.contact_phone)
        .bind(Json(&data.categories))
        .bind(data.priority.unwrap_or(DEFAULT_PRIORITY))
        .bind(Json(&response_time))
        .bind(Json(&working_hours))
        .bind(Json(&location))
        .bind(&data.account_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await;

        match result.map_err(RepoError::from) {
            Ok(_) => break id,
            Err(RepoError::Duplicate { field, .. }) if field == "id" && attempt < 3 => {
                attempt += 1;
            }
            Err(e) => {
                return Err(e.with_duplicate_value(|field| match field {
                    "name" => Some(data.name.clone()),
                    "code" => Some(data.code.clone()),
                    "contact_email" => Some(data.contact_email.clone()),
                    "account_id" => data.account_id.clone(),
                    _ => None,
                }));
            }
        }
    };

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create department".into()))
}

/// Partial update; absent fields keep their stored value
pub async fn update(pool: &SqlitePool, id: i64, data: DepartmentUpdate) -> RepoResult<Department> {
    let rows = sqlx::query(
        "UPDATE department SET \
         name = COALESCE(?, name), \
         code = COALESCE(?, code), \
         description = COALESCE(?, description), \
         contact_email = COALESCE(?, contact_email), \
         contact_phone = COALESCE(?, contact_phone), \
         categories = COALESCE(?, categories), \
         priority = COALESCE(?, priority), \
         response_time = COALESCE(?, response_time), \
         working_hours = COALESCE(?, working_hours), \
         location = COALESCE(?, location), \
         account_id = COALESCE(?, account_id), \
         is_active = COALESCE(?, is_active), \
         updated_at = ? \
         WHERE id = ?",
    )
    .bind(&data.name)
    .bind(&data.code)
    .bind(&data.description)
    .bind(&data.contact_email)
    .bind(&data.contact_phone)
    .bind(data.categories.as_ref().map(Json))
    .bind(data.priority)
    .bind(data.response_time.as_ref().map(Json::<&ResponseTime>))
    .bind(data.working_hours.as_ref().map(Json::<&WorkingHours>))
    .bind(data.location.as_ref().map(Json::<&Location>))
    .bind(&data.account_id)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
        RepoError::from(e).with_duplicate_value(|field| match field {
            "name" => data.name.clone(),
            "code" => data.code.clone(),
            "contact_email" => data.contact_email.clone(),
            "account_id" => data.account_id.clone(),
            _ => None,
        })
    })?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Department {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Department {id} not found")))
}

/// Soft delete: the row stays, only `is_active` and `updated_at` change
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<Department> {
    let rows = sqlx::query("UPDATE department SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Department {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Department {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn payload(name: &str, code: &str, email: &str) -> DepartmentCreate {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "code": code,
            "contact_email": email,
            "categories": ["roads", "lighting"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = DbService::in_memory().await.unwrap();
        let created = create(&db.pool, payload("Roads", "ROADS", "roads@city.gov"))
            .await
            .unwrap();

        assert!(created.is_active);
        assert_eq!(created.priority, DEFAULT_PRIORITY);
        assert_eq!(created.categories, vec!["roads", "lighting"]);
        assert_eq!(created.response_time, ResponseTime::default());

        let found = find_by_id(&db.pool, created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_duplicate_code_reports_field_and_value() {
        let db = DbService::in_memory().await.unwrap();
        create(&db.pool, payload("Roads", "ROADS", "roads@city.gov"))
            .await
            .unwrap();

        let err = create(&db.pool, payload("Streets", "ROADS", "streets@city.gov"))
            .await
            .unwrap_err();
        match err {
            RepoError::Duplicate { field, value } => {
                assert_eq!(field, "code");
                assert_eq!(value, "ROADS");
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = DbService::in_memory().await.unwrap();
        let created = create(&db.pool, payload("Roads", "ROADS", "roads@city.gov"))
            .await
            .unwrap();

        let updated = update(
            &db.pool,
            created.id,
            DepartmentUpdate {
                priority: Some(1),
                categories: Some(vec!["potholes".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.priority, 1);
        assert_eq!(updated.categories, vec!["potholes"]);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.contact_email, created.contact_email);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = DbService::in_memory().await.unwrap();
        let err = update(&db.pool, 12345, DepartmentUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = DbService::in_memory().await.unwrap();
        let roads = create(&db.pool, payload("Roads", "ROADS", "roads@city.gov"))
            .await
            .unwrap();
        let mut water = payload("Water Works", "WATER", "water@city.gov");
        water.categories = vec!["water".into()];
        water.description = Some("Leaks and 100% of the pipes".into());
        create(&db.pool, water).await.unwrap();
        deactivate(&db.pool, roads.id).await.unwrap();

        let all = DepartmentFilter::default();
        let (items, total) = list(&db.pool, &all, PageRequest::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].name, "Roads");

        let active = DepartmentFilter {
            is_active: Some(true),
            ..Default::default()
        };
        let (items, total) = list(&db.pool, &active, PageRequest::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].code, "WATER");

        let by_category = DepartmentFilter {
            category: Some("lighting".into()),
            ..Default::default()
        };
        let (_, total) = list(&db.pool, &by_category, PageRequest::default()).await.unwrap();
        assert_eq!(total, 1);

        let by_search = DepartmentFilter {
            search: Some("100%".into()),
            ..Default::default()
        };
        let (items, _) = list(&db.pool, &by_search, PageRequest::default()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "WATER");
    }

    #[tokio::test]
    async fn test_find_by_account_id() {
        let db = DbService::in_memory().await.unwrap();
        let mut input = payload("Roads", "ROADS", "roads@city.gov");
        input.account_id = Some("acct-roads".into());
        let created = create(&db.pool, input).await.unwrap();

        let found = find_by_account_id(&db.pool, "acct-roads").await.unwrap();
        assert_eq!(found.map(|d| d.id), Some(created.id));
        assert!(find_by_account_id(&db.pool, "nobody").await.unwrap().is_none());
    }
}
