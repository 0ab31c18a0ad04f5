use anyhow::Context;
use secrecy::SecretString;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::{
    auth::compute_password_hash, error::Error, library::reminders::Reminders, model::User,
    telemetry::spawn_blocking_with_tracing,
};

use super::error::DatabaseError;

const USER_COLUMNS: &str = "id, username, email, auth_token, subscription";

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

#[tracing::instrument(name = "create user", skip_all, fields(username, email))]
pub async fn create_user(
    pool: &PgPool,
    username: String,
    email: String,
    password: SecretString,
) -> Result<User, Error> {
    let password_hashed = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("compute password hash")
        .map_err(Error::Other)??;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users
            (username, email, password, auth_token)
        VALUES
            ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
    "#
    ))
    .bind(&username)
    .bind(&email)
    .bind(password_hashed)
    .bind(Uuid::new_v4())
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Conflict("Username or email is already taken".to_string())
        }
        _ => DatabaseError::DatabaseError(e),
    })?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(user)
}

/// Returns the user together with the stored password hash.
#[tracing::instrument(name = "get user credentials", skip(pool))]
pub async fn get_user_credentials_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<(User, String)>, Error> {
    let row = sqlx::query_as::<_, UserWithPassword>(&format!(
        r#"
        SELECT
            {USER_COLUMNS}, password
        FROM
            users
        WHERE
            username = $1
    "#
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(row.map(|row| (row.user, row.password)))
}

#[tracing::instrument(name = "get user password", skip(pool))]
pub async fn get_user_password(pool: &PgPool, user_id: i64) -> Result<String, Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT password FROM users WHERE id = $1
    "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

#[tracing::instrument(name = "get user by id", skip(pool))]
pub async fn get_user_by_id_optional(pool: &PgPool, user_id: i64) -> Result<Option<User>, Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT
            {USER_COLUMNS}
        FROM
            users
        WHERE
            id = $1
    "#
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(user)
}

/// Looks a user up by the opaque token handed to the mobile clients.
#[tracing::instrument(name = "get user by token", skip_all)]
pub async fn get_user_by_token(pool: &PgPool, token: Uuid) -> Result<Option<User>, Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT
            {USER_COLUMNS}
        FROM
            users
        WHERE
            auth_token = $1
    "#
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(user)
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, Error> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)
    "#,
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(exists)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, Error> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))
    "#,
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(exists)
}

#[tracing::instrument(name = "update password", skip(pool, password))]
pub async fn update_password(
    pool: &PgPool,
    user_id: i64,
    password: SecretString,
) -> Result<(), Error> {
    let password_hashed = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("compute password hash")
        .map_err(Error::Other)??;

    let result = sqlx::query(
        r#"
        UPDATE users
        SET
            password = $1
        WHERE
            id = $2
    "#,
    )
    .bind(password_hashed)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    Ok(())
}

#[tracing::instrument(name = "set subscription", skip(pool))]
pub async fn set_subscription(
    pool: &PgPool,
    user_id: i64,
    subscription: bool,
) -> Result<User, Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET
            subscription = $1
        WHERE
            id = $2
        RETURNING {USER_COLUMNS}
    "#
    ))
    .bind(subscription)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

#[tracing::instrument(name = "get reminders", skip(pool))]
pub async fn get_reminders(pool: &PgPool, user_id: i64) -> Result<Reminders, Error> {
    let reminders = sqlx::query_scalar::<_, Json<Reminders>>(
        r#"
        SELECT reminders FROM users WHERE id = $1
    "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))?;

    Ok(reminders.0)
}

/// Flips one reminder flag in place and returns the resulting preferences.
#[tracing::instrument(name = "set reminder", skip(pool))]
pub async fn set_reminder(
    pool: &PgPool,
    user_id: i64,
    field: &'static str,
    value: bool,
) -> Result<Reminders, Error> {
    let reminders = sqlx::query_scalar::<_, Json<Reminders>>(
        r#"
        UPDATE users
        SET
            reminders = reminders || jsonb_build_object($1::TEXT, $2::BOOLEAN)
        WHERE
            id = $3
        RETURNING reminders
    "#,
    )
    .bind(field)
    .bind(value)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))?;

    Ok(reminders.0)
}
