//! Authentication and access control
//!
//! - [`jwt`]: token issuing and validation
//! - [`middleware`]: `require_auth` plus the admin and department guards
//! - [`extractor`]: `FromRequestParts` impls for the principal types
//! - [`principal`]: [`AdminPrincipal`] and [`DepartmentPrincipal`]

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod principal;

pub use jwt::{
    Claims, CurrentUser, JwtConfig, JwtError, JwtService, TOKEN_TYPE_ACCESS, TOKEN_TYPE_ADMIN,
};
pub use middleware::{require_admin, require_auth, require_department};
pub use principal::{AdminPrincipal, DepartmentPrincipal};
