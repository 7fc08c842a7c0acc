//! Domain services
//!
//! Services sit between handlers and repositories: they normalize and
//! validate input, translate [`RepoError`](crate::db::repository::RepoError)
//! into [`AppError`](shared::AppError) and keep the cache coherent.

pub mod department_service;
pub mod issue_workflow;

pub use department_service::DepartmentService;
pub use issue_workflow::IssueWorkflowService;
