use std::sync::Arc;

use axum::extract::Request;

use crate::{library::visibility::Viewer, model::User, state::AppState};

mod api_auth;
mod jwt_auth;

pub use api_auth::{api_user_middleware, app_key_middleware, optional_api_user_middleware};
pub use jwt_auth::{jwt_auth_middleware, optional_jwt_auth_middleware};

fn attach_user(app_state: &AppState, req: &mut Request, user: User) {
    if app_state.reminder_counter.tick(user.id) {
        tracing::debug!(user_id = user.id, "Reminder pending");
    }

    req.extensions_mut().insert(Viewer::from(&user));
    req.extensions_mut().insert(Arc::new(user));
}
