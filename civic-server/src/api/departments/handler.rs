//! Department API Handlers

use axum::extract::{Path, Query, State};
use http::StatusCode;
use serde::Deserialize;

use crate::api::extract::AppJson;
use crate::auth::AdminPrincipal;
use crate::core::ServerState;
use crate::db::repository::department::DepartmentFilter;
use shared::models::{Department, DepartmentCreate, DepartmentUpdate};
use shared::request::{PageRequest, non_blank};
use shared::{ApiResponse, AppError, AppResult};

/// Raw list query; parsed leniently so bad pagination never fails a request
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub is_active: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    fn into_parts(self) -> AppResult<(DepartmentFilter, PageRequest)> {
        let is_active = match non_blank(self.is_active) {
            None => None,
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => Some(true),
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => Some(false),
            Some(_) => {
                return Err(AppError::invalid_field(
                    "is_active",
                    "is_active must be true or false",
                ));
            }
        };
        let page = PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref());
        let filter = DepartmentFilter {
            is_active,
            category: non_blank(self.category),
            search: non_blank(self.search),
        };
        Ok((filter, page))
    }
}

/// Parse a path id, failing validation before any lookup
pub(crate) fn parse_id(field: &str, raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::invalid_field(field, format!("{field} must be a positive integer")))
}

/// GET /api/departments - list, filter and paginate
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Department>>> {
    let (filter, page) = query.into_parts()?;
    let page = state.departments.list(&filter, page).await?;
    Ok(page.into())
}

/// GET /api/departments/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Department>> {
    let id = parse_id("id", &id)?;
    let department = state.departments.get(id).await?;
    Ok(ApiResponse::success(department))
}

/// POST /api/departments - create (admin)
pub async fn create(
    State(state): State<ServerState>,
    admin: AdminPrincipal,
    AppJson(payload): AppJson<DepartmentCreate>,
) -> AppResult<(StatusCode, ApiResponse<Department>)> {
    let department = state.departments.create(payload).await?;
    tracing::info!(admin_id = admin.id, department_id = department.id, "Admin created department");
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Department created", department),
    ))
}

/// PATCH /api/departments/{id} - partial update (admin)
pub async fn update(
    State(state): State<ServerState>,
    admin: AdminPrincipal,
    Path(id): Path<String>,
    AppJson(payload): AppJson<DepartmentUpdate>,
) -> AppResult<ApiResponse<Department>> {
    let id = parse_id("id", &id)?;
    let department = state.departments.update(id, payload).await?;
    tracing::info!(admin_id = admin.id, department_id = id, "Admin updated department");
    Ok(ApiResponse::success_with_message("Department updated", department))
}

/// DELETE /api/departments/{id} - soft delete (admin)
pub async fn deactivate(
    State(state): State<ServerState>,
    admin: AdminPrincipal,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Department>> {
    let id = parse_id("id", &id)?;
    let department = state.departments.deactivate(id).await?;
    tracing::info!(admin_id = admin.id, department_id = id, "Admin deactivated department");
    Ok(ApiResponse::success_with_message("Department deactivated", department))
}
