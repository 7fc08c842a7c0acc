//! Department registry API
//!
//! | Path | Method | Access |
//! |------|--------|--------|
//! | /api/departments | GET | public |
//! | /api/departments/{id} | GET | public |
//! | /api/departments | POST | admin |
//! | /api/departments/{id} | PATCH | admin |
//! | /api/departments/{id} | DELETE | admin |

mod handler;

pub(crate) use handler::parse_id;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Routes relative to `/api/departments`
pub fn routes(state: &ServerState) -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route("/{id}", patch(handler::update).delete(handler::deactivate))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    read_routes.merge(manage_routes)
}
