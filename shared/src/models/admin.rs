//! Administrator Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum AdminStatus {
    Active,
    Suspended,
}

/// Administrator record (provisioned out of band, read-only here)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// `admin` or `super_admin`
    pub role: String,
    pub status: AdminStatus,
    pub created_at: i64,
}

impl Admin {
    pub fn is_suspended(&self) -> bool {
        self.status == AdminStatus::Suspended
    }
}
