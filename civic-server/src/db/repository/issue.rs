//! Issue Repository

use super::{RepoError, RepoResult, like_pattern};
use shared::models::{Issue, IssueCreate, IssueStatus, Resolution};
use shared::request::PageRequest;
use shared::util::{now_millis, snowflake_id};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

const COLUMNS: &str = "id, title, description, category, status, department_id, reporter_id, \
                       address, resolution, acknowledged_at, started_at, resolved_at, closed_at, \
                       rejected_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct IssueRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    status: IssueStatus,
    department_id: Option<i64>,
    reporter_id: String,
    address: Option<String>,
    resolution: Option<String>,
    acknowledged_at: Option<i64>,
    started_at: Option<i64>,
    resolved_at: Option<i64>,
    closed_at: Option<i64>,
    rejected_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<IssueRow> for Issue {
    type Error = RepoError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let resolution = row
            .resolution
            .as_deref()
            .map(serde_json::from_str::<Resolution>)
            .transpose()
            .map_err(|e| RepoError::Database(format!("Corrupt resolution on issue {}: {e}", row.id)))?;

        Ok(Issue {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            status: row.status,
            department_id: row.department_id,
            reporter_id: row.reporter_id,
            address: row.address,
            resolution,
            acknowledged_at: row.acknowledged_at,
            started_at: row.started_at,
            resolved_at: row.resolved_at,
            closed_at: row.closed_at,
            rejected_at: row.rejected_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Filters for a department's issue list
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<String>,
    /// Case-insensitive substring on title, description, category
    pub search: Option<String>,
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, department_id: i64, filter: &'a IssueFilter) {
    qb.push(" WHERE department_id = ").push_bind(department_id);
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (LOWER(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(description) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(category) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// File a new issue in `pending`
pub async fn create(pool: &SqlitePool, data: &IssueCreate) -> RepoResult<Issue> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO issue (id, title, description, category, status, department_id, \
         reporter_id, address, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.title.trim())
    .bind(data.description.trim())
    .bind(data.category.trim())
    .bind(IssueStatus::Pending)
    .bind(data.department_id)
    .bind(&data.reporter_id)
    .bind(&data.address)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Database(msg) if msg.contains("FOREIGN KEY") => {
            RepoError::Validation("department_id does not reference a department".into())
        }
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create issue".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Issue>> {
    let row = sqlx::query_as::<_, IssueRow>(&format!("SELECT {COLUMNS} FROM issue WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Issue::try_from).transpose()
}

/// Issue `id` only if it is assigned to `department_id`
pub async fn find_for_department(
    pool: &SqlitePool,
    department_id: i64,
    id: i64,
) -> RepoResult<Option<Issue>> {
    let row = sqlx::query_as::<_, IssueRow>(&format!(
        "SELECT {COLUMNS} FROM issue WHERE id = ? AND department_id = ?"
    ))
    .bind(id)
    .bind(department_id)
    .fetch_optional(pool)
    .await?;
    row.map(Issue::try_from).transpose()
}

/// One page of a department's issues, newest first, plus the total match count
pub async fn list_for_department(
    pool: &SqlitePool,
    department_id: i64,
    filter: &IssueFilter,
    page: PageRequest,
) -> RepoResult<(Vec<Issue>, u64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM issue");
    push_filters(&mut count_qb, department_id, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM issue"));
    push_filters(&mut qb, department_id, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as::<IssueRow>().fetch_all(pool).await?;

    let items = rows
        .into_iter()
        .map(Issue::try_from)
        .collect::<RepoResult<Vec<_>>>()?;
    Ok((items, total.max(0) as u64))
}

/// Move an issue owned by `department_id` into `target`
///
/// The status guard lives in the `WHERE` clause, so the check and the write
/// are one statement. Returns `false` when no row matched: the issue is
/// missing, belongs elsewhere, or sits in a status that cannot reach
/// `target`. The entry timestamp for `target` is stamped in the same write,
/// and `resolution` is stored when given.
pub async fn transition(
    pool: &SqlitePool,
    department_id: i64,
    id: i64,
    target: IssueStatus,
    resolution: Option<&Resolution>,
) -> RepoResult<bool> {
    let predecessors = IssueStatus::predecessors_of(target);
    if predecessors.is_empty() {
        return Ok(false);
    }
    let now = now_millis();

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE issue SET status = ");
    qb.push_bind(target);
    if let Some(column) = target.timestamp_column() {
        qb.push(format!(", {column} = ")).push_bind(now);
    }
    if let Some(resolution) = resolution {
        qb.push(", resolution = ").push_bind(Json(resolution));
    }
    qb.push(", updated_at = ").push_bind(now);
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND department_id = ").push_bind(department_id);
    qb.push(" AND status IN (");
    let mut separated = qb.separated(", ");
    for status in predecessors {
        separated.push_bind(status);
    }
    separated.push_unseparated(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
