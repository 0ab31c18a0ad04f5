use std::{borrow::Cow, sync::Arc};

use anyhow::Context;
use axum::{Extension, Json, extract::State, http::StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    auth::{error::AuthError, verify_password_hash},
    db::user::{get_user_password, set_subscription, update_password},
    error::Error,
    model::User,
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

use super::auth::validate_password;

#[tracing::instrument(name = "[GET] me", skip_all)]
pub async fn index(Extension(user): Extension<Arc<User>>) -> Result<Json<Arc<User>>, Error> {
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: SecretString,
    pub new_password: SecretString,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_password(&mut errors, "new_password", &self.new_password);

        if self.old_password.expose_secret().is_empty() {
            errors.add(
                "old_password",
                ValidationError::new("required")
                    .with_message(Cow::from("Previous password is required")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[tracing::instrument(name = "[PUT] me/password", skip_all)]
pub async fn change_password(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    axum::extract::Json(request): axum::extract::Json<ChangePasswordRequest>,
) -> Result<StatusCode, Error> {
    request.validate().map_err(Error::Validation)?;

    let hashed_password = get_user_password(&app_state.pool, user.id).await?;
    let old_password = request.old_password;

    spawn_blocking_with_tracing(move || verify_password_hash(hashed_password, old_password))
        .await
        .context("verify password hash")
        .map_err(Error::Other)?
        .map_err(|_| Error::Auth(AuthError::IncorrectCredential))?;

    update_password(&app_state.pool, user.id, request.new_password).await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: bool,
}

#[tracing::instrument(name = "[PUT] me/subscription", skip_all)]
pub async fn update_subscription(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    axum::extract::Json(request): axum::extract::Json<SubscriptionRequest>,
) -> Result<Json<User>, Error> {
    let user = set_subscription(&app_state.pool, user.id, request.subscription).await?;

    Ok(Json(user))
}
