//! Authentication middleware
//!
//! `require_auth` turns a bearer token into a [`CurrentUser`]. The admin and
//! department guards build on it and attach their principal to the request
//! extensions.
//!
//! | Failure | Status |
//! |---------|--------|
//! | No `Authorization` header | 401 NotAuthenticated |
//! | Expired token | 401 TokenExpired |
//! | Invalid token | 401 TokenInvalid |
//! | Admin guard, token type not `admin` | 403 AdminRequired |
//! | Admin guard, subject is not an administrator | 401 NotAuthenticated |
//! | Admin guard, administrator suspended | 403 AdminSuspended |
//! | Department guard, role not `department` | 403 DepartmentRoleRequired |
//! | Department guard, no department bound | 403 DepartmentNotBound |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, Uri};

use crate::auth::{
    AdminPrincipal, CurrentUser, DepartmentPrincipal, JwtError, JwtService, TOKEN_TYPE_ADMIN,
};
use crate::core::ServerState;
use crate::db::repository::admin;
use crate::security_log;
use shared::{AppError, ErrorCode};

/// Validate the bearer token in `headers`
pub(crate) fn authenticate(
    state: &ServerState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<CurrentUser, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = uri.to_string());
            return Err(AppError::unauthorized());
        }
    };

    match state.get_jwt_service().validate_token(token) {
        Ok(claims) => Ok(CurrentUser::from(claims)),
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = uri.to_string()
            );
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Resolve the bearer token to an active administrator
pub(crate) async fn authenticate_admin(
    state: &ServerState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<AdminPrincipal, AppError> {
    let user = authenticate(state, headers, uri)?;

    if user.token_type != TOKEN_TYPE_ADMIN {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            token_type = user.token_type.clone()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    let Ok(admin_id) = user.id.parse::<i64>() else {
        security_log!("WARN", "admin_unknown", user_id = user.id.clone());
        return Err(AppError::unauthorized());
    };

    let Some(record) = admin::find_by_id(&state.db.pool, admin_id).await? else {
        security_log!("WARN", "admin_unknown", user_id = user.id.clone());
        return Err(AppError::unauthorized());
    };

    if record.is_suspended() {
        security_log!(
            "WARN",
            "admin_suspended",
            admin_id = record.id,
            email = record.email.clone()
        );
        return Err(AppError::new(ErrorCode::AdminSuspended));
    }

    Ok(AdminPrincipal::from(record))
}

/// Resolve an authenticated user to the department it acts for
///
/// The department id is cached on `user`, so a second call in the same
/// request skips the lookup.
pub(crate) async fn resolve_department(
    state: &ServerState,
    user: &mut CurrentUser,
) -> Result<DepartmentPrincipal, AppError> {
    if !user.is_department() {
        security_log!(
            "WARN",
            "department_role_required",
            user_id = user.id.clone(),
            role = user.role.clone()
        );
        return Err(AppError::new(ErrorCode::DepartmentRoleRequired));
    }

    let department_id = match user.department_id {
        Some(id) => id,
        None => {
            let Some(department) = state.departments.find_by_account(&user.id).await? else {
                security_log!("WARN", "department_not_bound", user_id = user.id.clone());
                return Err(AppError::new(ErrorCode::DepartmentNotBound));
            };
            user.department_id = Some(department.id);
            department.id
        }
    };

    Ok(DepartmentPrincipal {
        user_id: user.id.clone(),
        username: user.username.clone(),
        department_id,
    })
}

/// Authentication middleware, requires a valid bearer token
///
/// Inserts [`CurrentUser`] into the request extensions. CORS preflight
/// requests pass through untouched.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let user = authenticate(&state, req.headers(), req.uri())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Admin guard
///
/// Independent of `require_auth`: reads the bearer token itself and inserts
/// [`AdminPrincipal`].
pub async fn require_admin(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let principal = authenticate_admin(&state, req.headers(), req.uri()).await?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Department guard
///
/// Must run after `require_auth`. Inserts [`DepartmentPrincipal`] and writes
/// the resolved department id back onto [`CurrentUser`].
pub async fn require_department(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let mut user = req
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(AppError::unauthorized)?;

    let principal = resolve_department(&state, &mut user).await?;
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
