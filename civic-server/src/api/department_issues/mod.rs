//! Department issue queue API
//!
//! | Path | Method | Access |
//! |------|--------|--------|
//! | /api/departments/me/issues | GET | department |
//! | /api/departments/issues/{issue_id}/status | PATCH | department |
//! | /api/departments/issues/{issue_id}/resolve | POST | department |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::{require_auth, require_department};
use crate::core::ServerState;

/// Routes relative to `/api/departments`
pub fn routes(state: &ServerState) -> Router<ServerState> {
    // Layers run bottom-up: require_auth, then the department guard
    Router::new()
        .route("/me/issues", get(handler::list_mine))
        .route("/issues/{issue_id}/status", patch(handler::update_status))
        .route("/issues/{issue_id}/resolve", post(handler::resolve))
        .layer(middleware::from_fn_with_state(state.clone(), require_department))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
