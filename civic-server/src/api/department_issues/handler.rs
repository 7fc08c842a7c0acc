//! Department Issue Handlers

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::api::departments::parse_id;
use crate::api::extract::AppJson;
use crate::auth::DepartmentPrincipal;
use crate::core::ServerState;
use crate::db::repository::issue::IssueFilter;
use crate::services::issue_workflow::parse_status;
use shared::models::{Issue, IssueResolve, IssueStatusUpdate};
use shared::request::{PageRequest, non_blank};
use shared::{ApiResponse, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct IssueListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl IssueListQuery {
    fn into_parts(self) -> AppResult<(IssueFilter, PageRequest)> {
        let status = non_blank(self.status)
            .map(|raw| parse_status(&raw))
            .transpose()?;
        let page = PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref());
        let filter = IssueFilter {
            status,
            category: non_blank(self.category),
            search: non_blank(self.search),
        };
        Ok((filter, page))
    }
}

/// GET /api/departments/me/issues - the caller's own queue
pub async fn list_mine(
    State(state): State<ServerState>,
    principal: DepartmentPrincipal,
    Query(query): Query<IssueListQuery>,
) -> AppResult<ApiResponse<Vec<Issue>>> {
    let (filter, page) = query.into_parts()?;
    let page = state
        .issues
        .list_mine(principal.department_id, &filter, page)
        .await?;
    Ok(page.into())
}

/// PATCH /api/departments/issues/{issue_id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    principal: DepartmentPrincipal,
    Path(issue_id): Path<String>,
    AppJson(payload): AppJson<IssueStatusUpdate>,
) -> AppResult<ApiResponse<Issue>> {
    let issue_id = parse_id("issue_id", &issue_id)?;
    let issue = state
        .issues
        .update_status(principal.department_id, issue_id, &payload.status)
        .await?;
    Ok(ApiResponse::success_with_message("Issue status updated", issue))
}

/// POST /api/departments/issues/{issue_id}/resolve
pub async fn resolve(
    State(state): State<ServerState>,
    principal: DepartmentPrincipal,
    Path(issue_id): Path<String>,
    AppJson(payload): AppJson<IssueResolve>,
) -> AppResult<ApiResponse<Issue>> {
    let issue_id = parse_id("issue_id", &issue_id)?;
    let issue = state
        .issues
        .resolve(principal.department_id, &principal.user_id, issue_id, payload)
        .await?;
    Ok(ApiResponse::success_with_message("Issue resolved", issue))
}
