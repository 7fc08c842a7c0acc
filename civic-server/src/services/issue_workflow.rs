//! Issue status workflow
//!
//! Every operation is scoped to the acting department: an issue assigned to
//! any other department (or to none) behaves as if it did not exist.

use crate::db::repository::issue::{self, IssueFilter};
use shared::models::{Issue, IssueCreate, IssueResolve, IssueStatus, Resolution};
use shared::request::PageRequest;
use shared::response::Page;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;
use validator::Validate;

fn not_found(issue_id: i64) -> AppError {
    AppError::with_message(ErrorCode::IssueNotFound, format!("Issue {issue_id} not found"))
}

/// Parse a client-supplied status value
pub fn parse_status(raw: &str) -> AppResult<IssueStatus> {
    raw.trim().parse::<IssueStatus>().map_err(|_| {
        let allowed: Vec<&str> = IssueStatus::ALL.iter().map(|s| s.as_str()).collect();
        AppError::invalid_field("status", format!("status must be one of: {}", allowed.join(", ")))
    })
}

#[derive(Clone)]
pub struct IssueWorkflowService {
    pool: SqlitePool,
}

impl IssueWorkflowService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Storage-level insert used by the citizen intake path
    pub async fn create(&self, data: IssueCreate) -> AppResult<Issue> {
        data.validate()?;
        let issue = issue::create(&self.pool, &data).await?;
        tracing::info!(issue_id = issue.id, department_id = ?issue.department_id, "Issue filed");
        Ok(issue)
    }

    /// The department's own queue, newest first
    pub async fn list_mine(
        &self,
        department_id: i64,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> AppResult<Page<Issue>> {
        let (items, total) =
            issue::list_for_department(&self.pool, department_id, filter, page).await?;
        Ok(Page::new(items, page.page, page.limit, total))
    }

    /// Move an issue to `raw_status`
    pub async fn update_status(
        &self,
        department_id: i64,
        issue_id: i64,
        raw_status: &str,
    ) -> AppResult<Issue> {
        let target = parse_status(raw_status)?;
        self.apply(department_id, issue_id, target, None).await
    }

    /// Mark an issue resolved and store the resolution details
    pub async fn resolve(
        &self,
        department_id: i64,
        resolved_by: &str,
        issue_id: i64,
        data: IssueResolve,
    ) -> AppResult<Issue> {
        data.validate()?;
        let resolution = data.into_resolution(resolved_by);
        self.apply(department_id, issue_id, IssueStatus::Resolved, Some(resolution))
            .await
    }

    async fn apply(
        &self,
        department_id: i64,
        issue_id: i64,
        target: IssueStatus,
        resolution: Option<Resolution>,
    ) -> AppResult<Issue> {
        let moved = issue::transition(
            &self.pool,
            department_id,
            issue_id,
            target,
            resolution.as_ref(),
        )
        .await?;

        // Re-read inside the same scope: either the moved row, or the reason
        // the conditional update matched nothing
        let current = issue::find_for_department(&self.pool, department_id, issue_id)
            .await?
            .ok_or_else(|| not_found(issue_id))?;

        if !moved {
            tracing::warn!(
                issue_id,
                department_id,
                from = %current.status,
                to = %target,
                "Rejected issue status transition"
            );
            return Err(AppError::with_message(
                ErrorCode::IssueInvalidTransition,
                format!("Cannot move issue from {} to {}", current.status, target),
            )
            .with_detail("current_status", current.status.as_str())
            .with_detail("requested_status", target.as_str()));
        }

        tracing::info!(issue_id, department_id, status = %target, "Issue status changed");
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::department;
    use shared::models::DepartmentCreate;

    struct Fixture {
        service: IssueWorkflowService,
        roads: i64,
        water: i64,
    }

    async fn fixture() -> Fixture {
        let db = DbService::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for code in ["ROADS", "WATER"] {
            let data: DepartmentCreate = serde_json::from_value(serde_json::json!({
                "name": code,
                "code": code,
                "contact_email": format!("{}@city.gov", code.to_lowercase()),
                "categories": ["general"]
            }))
            .unwrap();
            ids.push(department::create(&db.pool, data).await.unwrap().id);
        }
        Fixture {
            service: IssueWorkflowService::new(db.pool),
            roads: ids[0],
            water: ids[1],
        }
    }

    async fn file_issue(fx: &Fixture, department_id: i64) -> Issue {
        fx.service
            .create(IssueCreate {
                title: "Streetlight out".into(),
                description: "Dark corner at 5th and Main".into(),
                category: "lighting".into(),
                department_id: Some(department_id),
                reporter_id: "citizen-7".into(),
                address: Some("5th and Main".into()),
            })
            .await
            .unwrap()
    }

    fn resolve_payload(description: &str) -> IssueResolve {
        IssueResolve {
            description: description.into(),
            evidence: vec![],
            cost: None,
            resources_used: vec![],
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("in_progress").unwrap(), IssueStatus::InProgress);
        let err = parse_status("done").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.errors[0].field, "status");
    }

    #[tokio::test]
    async fn test_forward_moves() {
        let fx = fixture().await;
        let issue = file_issue(&fx, fx.roads).await;

        let acked = fx.service.update_status(fx.roads, issue.id, "acknowledged").await.unwrap();
        assert_eq!(acked.status, IssueStatus::Acknowledged);
        assert!(acked.acknowledged_at.is_some());

        let resolved = fx.service.update_status(fx.roads, issue.id, "resolved").await.unwrap();
        assert_eq!(resolved.status, IssueStatus::Resolved);
        assert!(resolved.started_at.is_none());
    }

    #[tokio::test]
    async fn test_backward_move_is_invalid_transition() {
        let fx = fixture().await;
        let issue = file_issue(&fx, fx.roads).await;
        fx.service.update_status(fx.roads, issue.id, "resolved").await.unwrap();

        let err = fx
            .service
            .update_status(fx.roads, issue.id, "acknowledged")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IssueInvalidTransition);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
        let details = err.details.unwrap();
        assert_eq!(details["current_status"], "resolved");
        assert_eq!(details["requested_status"], "acknowledged");
    }

    #[tokio::test]
    async fn test_terminal_states_are_final() {
        let fx = fixture().await;
        let closed = file_issue(&fx, fx.roads).await;
        fx.service.update_status(fx.roads, closed.id, "closed").await.unwrap();
        let rejected = file_issue(&fx, fx.roads).await;
        fx.service.update_status(fx.roads, rejected.id, "rejected").await.unwrap();

        for (id, target) in [(closed.id, "rejected"), (rejected.id, "closed"), (rejected.id, "pending")] {
            let err = fx.service.update_status(fx.roads, id, target).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::IssueInvalidTransition);
        }
    }

    #[tokio::test]
    async fn test_other_department_sees_not_found() {
        let fx = fixture().await;
        let issue = file_issue(&fx, fx.roads).await;

        let err = fx
            .service
            .update_status(fx.water, issue.id, "acknowledged")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IssueNotFound);

        let err = fx
            .service
            .resolve(fx.water, "acct-water", issue.id, resolve_payload("Fixed the lamp"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IssueNotFound);
    }

    #[tokio::test]
    async fn test_resolve_short_description_leaves_issue_untouched() {
        let fx = fixture().await;
        let issue = file_issue(&fx, fx.roads).await;

        let err = fx
            .service
            .resolve(fx.roads, "acct-roads", issue.id, resolve_payload("ok"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let page = fx
            .service
            .list_mine(fx.roads, &IssueFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items[0].status, IssueStatus::Pending);
        assert!(page.items[0].resolution.is_none());
    }

    #[tokio::test]
    async fn test_resolve_records_resolution() {
        let fx = fixture().await;
        let issue = file_issue(&fx, fx.roads).await;

        let resolved = fx
            .service
            .resolve(
                fx.roads,
                "acct-roads",
                issue.id,
                IssueResolve {
                    description: "  Replaced the bulb  ".into(),
                    evidence: vec!["photo-1".into()],
                    cost: Some(35.0),
                    resources_used: vec!["bucket truck".into()],
                },
            )
            .await
            .unwrap();

        assert_eq!(resolved.status, IssueStatus::Resolved);
        assert!(resolved.resolved_at.is_some());
        let resolution = resolved.resolution.unwrap();
        assert_eq!(resolution.description, "Replaced the bulb");
        assert_eq!(resolution.resolved_by, "acct-roads");
        assert_eq!(resolution.cost, Some(35.0));
    }
}
