//! Request principals
//!
//! Guards attach exactly one principal type to a request. Handlers name the
//! principal they need as an extractor, so an admin credential can never
//! reach a department handler and vice versa.

use serde::Serialize;
use shared::models::{Admin, AdminStatus};

/// Verified administrator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminPrincipal {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: AdminStatus,
}

impl From<Admin> for AdminPrincipal {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            role: admin.role,
            status: admin.status,
        }
    }
}

/// `department`-role account resolved to its owning department
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentPrincipal {
    /// Account id (token subject)
    pub user_id: String,
    pub username: String,
    pub department_id: i64,
}
