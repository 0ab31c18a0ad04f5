use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    auth::error::AuthError,
    db::user::get_user_by_token,
    error::Error,
    library::visibility::Viewer,
    model::User,
    state::SharedAppState,
};

use super::attach_user;

pub const APP_KEY_HEADER: &str = "x-app-key";
pub const USER_TOKEN_HEADER: &str = "x-user-token";

fn user_token(req: &Request) -> Result<Option<Uuid>, Error> {
    let Some(header) = req.headers().get(USER_TOKEN_HEADER) else {
        return Ok(None);
    };

    header
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .map(Some)
        .ok_or(Error::Auth(AuthError::Unauthenticated))
}

async fn user_from_token(app_state: &SharedAppState, token: Uuid) -> Result<User, Error> {
    get_user_by_token(&app_state.pool, token)
        .await?
        .ok_or(Error::Auth(AuthError::Unauthenticated))
}

/// Rejects requests that do not carry the shared mobile application key.
#[tracing::instrument(name = "[MIDDLEWARE] app key", skip_all)]
pub async fn app_key_middleware(
    State(app_state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let authorized = req
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|key| key == app_state.config.api.app_key.expose_secret());

    if !authorized {
        return Err(Error::Auth(AuthError::InvalidAppKey));
    }

    Ok(next.run(req).await)
}

#[tracing::instrument(name = "[MIDDLEWARE] api user", skip_all)]
pub async fn api_user_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let token = user_token(&req)?.ok_or(Error::Auth(AuthError::Unauthenticated))?;
    let user = user_from_token(&app_state, token).await?;

    attach_user(&app_state, &mut req, user);

    Ok(next.run(req).await)
}

#[tracing::instrument(name = "[MIDDLEWARE] optional api user", skip_all)]
pub async fn optional_api_user_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let viewer = match user_token(&req)? {
        Some(token) => Viewer::from(&user_from_token(&app_state, token).await?),
        None => Viewer::Anonymous,
    };

    req.extensions_mut().insert(viewer);

    Ok(next.run(req).await)
}
