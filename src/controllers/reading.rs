use std::{borrow::Cow, sync::Arc};

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::{Validate, ValidationError};

use crate::{
    db::{
        added_books::{add_book_to_home, open_book, remove_book_from_home, set_current_page},
        ratings::{add_comment, upsert_rating},
    },
    error::Error,
    library::{LibraryError, visibility::Viewer},
    model::{Comment, ReadingPosition, User},
    state::SharedAppState,
};

use super::{Surface, UrlPath, books::get_visible_book};

#[tracing::instrument(name = "[POST] books/{id}/home", skip_all, fields(path.id))]
pub async fn add(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    Extension(viewer): Extension<Viewer>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    let book = get_visible_book(&app_state, &viewer, path.id).await?;

    if book.blocked_book {
        return Err(Error::Library(LibraryError::BlockedBook(book.id)));
    }

    add_book_to_home(&app_state.pool, user.id, book.id).await?;

    Ok(StatusCode::CREATED)
}

#[tracing::instrument(name = "[DELETE] books/{id}/home", skip_all, fields(path.id))]
pub async fn remove(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    remove_book_from_home(&app_state.pool, user.id, path.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "[POST] books/{id}/open", skip_all, fields(path.id))]
pub async fn open(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    Path(path): Path<UrlPath>,
) -> Result<Json<ReadingPosition>, Error> {
    let position = open_book(&app_state.pool, user.id, path.id).await?;

    Ok(Json(position))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1))]
    pub page: i32,
}

#[tracing::instrument(name = "[PUT] books/{id}/page", skip_all, fields(path.id))]
pub async fn set_page(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    Path(path): Path<UrlPath>,
    axum::extract::Json(request): axum::extract::Json<PageRequest>,
) -> Result<Json<ReadingPosition>, Error> {
    request.validate().map_err(Error::Validation)?;

    let position = set_current_page(&app_state.pool, user.id, path.id, request.page).await?;

    Ok(Json(position))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct RatingRequest {
    #[validate(range(min = 1, max = 10))]
    pub rating: i16,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, PartialEq)]
pub struct RatingResponse {
    pub rating: f64,
}

#[tracing::instrument(name = "[PUT] books/{id}/rating", skip_all, fields(path.id))]
pub async fn rate(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    Extension(viewer): Extension<Viewer>,
    Path(path): Path<UrlPath>,
    axum::extract::Json(request): axum::extract::Json<RatingRequest>,
) -> Result<Json<RatingResponse>, Error> {
    request.validate().map_err(Error::Validation)?;

    let book = get_visible_book(&app_state, &viewer, path.id).await?;
    let rating = upsert_rating(&app_state.pool, user.id, book.id, request.rating).await?;

    Ok(Json(RatingResponse { rating }))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct CommentRequest {
    #[validate(custom(function = "validate_comment_text"))]
    pub text: String,
}

/// Comments are stored trimmed, so the bounds apply to the trimmed text.
fn validate_comment_text(text: &str) -> Result<(), ValidationError> {
    let length = text.trim().chars().count();

    if !(1..=500).contains(&length) {
        return Err(ValidationError::new("length")
            .with_message(Cow::from("Comment must be between 1 and 500 characters")));
    }

    Ok(())
}

#[tracing::instrument(name = "[POST] books/{id}/comments", skip_all, fields(path.id))]
pub async fn comment(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(user): Extension<Arc<User>>,
    Extension(viewer): Extension<Viewer>,
    Path(path): Path<UrlPath>,
    axum::extract::Json(request): axum::extract::Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), Error> {
    request.validate().map_err(Error::Validation)?;

    let book = get_visible_book(&app_state, &viewer, path.id).await?;
    let comment = add_comment(&app_state.pool, user.id, book.id, request.text.trim()).await?;

    Ok((StatusCode::CREATED, Json(surface.present(comment))))
}
