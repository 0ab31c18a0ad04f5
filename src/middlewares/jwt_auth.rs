use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{decode_jwt, error::AuthError},
    db::user::get_user_by_id_optional,
    error::Error,
    library::visibility::Viewer,
    model::User,
    state::SharedAppState,
};

use super::attach_user;

/// Token of an `Authorization: Bearer <token>` header. `None` when the header
/// is absent, an error when it is present but malformed.
fn bearer_token(req: &Request) -> Result<Option<String>, Error> {
    let auth_header = match req.headers().get(axum::http::header::AUTHORIZATION) {
        Some(header) => header
            .to_str()
            .map_err(|_| Error::Auth(AuthError::Unauthenticated))?,
        None => return Ok(None),
    };

    let mut header = auth_header.split_whitespace();
    let (bearer_option, token_option) = (header.next(), header.next());

    let bearer = match bearer_option {
        Some(value) => value.to_lowercase(),
        None => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
    };

    if bearer != *"bearer" {
        return Err(Error::Auth(AuthError::Unauthenticated));
    }

    match token_option {
        Some(value) => Ok(Some(value.to_string())),
        None => Err(Error::Auth(AuthError::Unauthenticated)),
    }
}

async fn user_from_jwt(app_state: &SharedAppState, token: String) -> Result<User, Error> {
    let token_data = decode_jwt(token, &app_state.config.jwt)
        .map_err(|_| Error::Auth(AuthError::Unauthenticated))?;

    get_user_by_id_optional(&app_state.pool, token_data.claims.user_id)
        .await?
        .ok_or(Error::Auth(AuthError::Unauthenticated))
}

#[tracing::instrument(name = "[MIDDLEWARE] jwt auth", skip_all)]
pub async fn jwt_auth_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let token = bearer_token(&req)?.ok_or(Error::Auth(AuthError::Unauthenticated))?;
    let user = user_from_jwt(&app_state, token).await?;

    attach_user(&app_state, &mut req, user);

    Ok(next.run(req).await)
}

/// Lets anonymous requests through as [`Viewer::Anonymous`]; a supplied but
/// invalid token is still rejected.
#[tracing::instrument(name = "[MIDDLEWARE] optional jwt auth", skip_all)]
pub async fn optional_jwt_auth_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let viewer = match bearer_token(&req)? {
        Some(token) => Viewer::from(&user_from_jwt(&app_state, token).await?),
        None => Viewer::Anonymous,
    };

    req.extensions_mut().insert(viewer);

    Ok(next.run(req).await)
}
