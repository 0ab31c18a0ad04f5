use std::borrow::Cow;

use anyhow::Context;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::{encode_jwt, error::AuthError, verify_password_hash},
    db::user::{create_user, email_exists, get_user_credentials_by_username, username_exists},
    error::Error,
    model::User,
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

pub(crate) fn is_valid_username(username: &str) -> bool {
    (2..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn validate_password(
    errors: &mut ValidationErrors,
    field: &'static str,
    password: &SecretString,
) {
    if !password
        .expose_secret()
        .validate_length(Some(6), Some(16), None)
    {
        errors.add(
            field,
            ValidationError::new("password_length")
                .with_message(Cow::from("Password length must be between 6 and 16")),
        );
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !is_valid_username(&self.username) {
            errors.add(
                "username",
                ValidationError::new("username_format").with_message(Cow::from(
                    "Username must be 2 to 30 letters, digits or underscores",
                )),
            );
        }

        if !self.email.validate_email() {
            errors.add(
                "email",
                ValidationError::new("email_email")
                    .with_message(Cow::from("Incorrect email format")),
            );
        }

        validate_password(&mut errors, "password", &self.password);

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.username.validate_length(Some(1), Some(30), None) {
            errors.add(
                "username",
                ValidationError::new("username_length")
                    .with_message(Cow::from("Username length must be between 1 and 30")),
            );
        }

        let password = self.password.expose_secret();
        if !password.validate_length(Some(1), Some(16), None) {
            errors.add(
                "password",
                ValidationError::new("password_length")
                    .with_message(Cow::from("Password length must be between 1 and 16")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[tracing::instrument(name = "[POST] auth/register", skip_all)]
pub async fn register(
    State(app_state): State<SharedAppState>,
    axum::extract::Json(request): axum::extract::Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), Error> {
    if !app_state.config.application.allow_registration {
        return Err(Error::Auth(AuthError::RegistrationClosed));
    }

    request.validate().map_err(Error::Validation)?;

    let user = create_user(
        &app_state.pool,
        request.username,
        request.email,
        request.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn authenticate(app_state: &SharedAppState, request: LoginRequest) -> Result<User, Error> {
    request.validate().map_err(Error::Validation)?;

    let (user, hashed_password) =
        get_user_credentials_by_username(&app_state.pool, &request.username)
            .await?
            .ok_or(Error::Auth(AuthError::IncorrectCredential))?;

    spawn_blocking_with_tracing(move || verify_password_hash(hashed_password, request.password))
        .await
        .context("verify password hash")
        .map_err(Error::Other)?
        .map_err(|_| Error::Auth(AuthError::IncorrectCredential))?;

    Ok(user)
}

#[tracing::instrument(name = "[POST] auth/login", skip_all)]
pub async fn login(
    State(app_state): State<SharedAppState>,
    axum::extract::Json(request): axum::extract::Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Error> {
    let user = authenticate(&app_state, request).await?;

    let token = spawn_blocking_with_tracing(move || encode_jwt(user.id, &app_state.config.jwt))
        .await
        .context("encode jwt")
        .map_err(Error::Other)??;

    Ok(Json(AuthResponse { token }))
}

/// Mobile login: hands out the per-user token expected in `x-user-token`.
#[tracing::instrument(name = "[POST] api/auth", skip_all)]
pub async fn api_login(
    State(app_state): State<SharedAppState>,
    axum::extract::Json(request): axum::extract::Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Error> {
    let user = authenticate(&app_state, request).await?;

    Ok(Json(AuthResponse {
        token: user.auth_token.to_string(),
    }))
}

#[derive(Deserialize, Debug)]
pub struct ExistsQuery {
    username: Option<String>,
    email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ExistsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
}

#[tracing::instrument(name = "[GET] auth/exists", skip_all)]
pub async fn exists(
    State(app_state): State<SharedAppState>,
    Query(query): Query<ExistsQuery>,
) -> Result<Json<ExistsResponse>, Error> {
    if query.username.is_none() && query.email.is_none() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "username",
            ValidationError::new("required")
                .with_message(Cow::from("Either username or email is required")),
        );
        return Err(Error::Validation(errors));
    }

    let username = match &query.username {
        Some(username) => Some(username_exists(&app_state.pool, username).await?),
        None => None,
    };
    let email = match &query.email {
        Some(email) => Some(email_exists(&app_state.pool, email).await?),
        None => None,
    };

    Ok(Json(ExistsResponse { username, email }))
}
