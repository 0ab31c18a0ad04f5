use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    db::{
        added_books::{count_added, is_added},
        books::{BookQuery, NewBook, get_book_by_id, insert_book},
        error::DatabaseError,
        ratings::{get_comments, get_rating_stats},
    },
    error::Error,
    library::visibility::Viewer,
    model::{BookDetail, BookSummary, SelectedBook, User},
    state::SharedAppState,
};

use super::{Surface, UrlPath};

/// Loads a book the viewer is allowed to see. Private books of other users
/// are reported as missing.
pub(crate) async fn get_visible_book(
    app_state: &SharedAppState,
    viewer: &Viewer,
    book_id: i64,
) -> Result<BookDetail, Error> {
    let book = get_book_by_id(&app_state.pool, book_id).await?;

    if !viewer.can_see(&book) {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    Ok(book)
}

#[tracing::instrument(name = "[GET] books/{id}", skip_all, fields(path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(viewer): Extension<Viewer>,
    Path(path): Path<UrlPath>,
) -> Result<Json<SelectedBook>, Error> {
    let book = get_visible_book(&app_state, &viewer, path.id).await?;

    let (rating, rated_count) = get_rating_stats(&app_state.pool, book.id).await?;
    let user_reading_count = count_added(&app_state.pool, book.id).await?;
    let is_added_book = match viewer.user_id() {
        Some(user_id) => is_added(&app_state.pool, user_id, book.id).await?,
        None => false,
    };
    let comments = get_comments(&app_state.pool, book.id).await?;

    let selected = SelectedBook {
        book,
        comments,
        is_added_book,
        user_reading_count,
        book_rating: rating.unwrap_or(0.0),
        book_rated_count: rated_count,
    };

    Ok(Json(surface.present(selected)))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 150))]
    pub book_name: String,
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    #[validate(length(min = 1, max = 30))]
    pub category: String,
    #[validate(length(min = 1, max = 30))]
    pub language: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 2048))]
    pub cover_url: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub book_file: String,
    #[serde(default)]
    pub private_book: bool,
}

impl From<CreateBookRequest> for NewBook {
    fn from(request: CreateBookRequest) -> Self {
        NewBook {
            book_name: request.book_name.trim().to_string(),
            author: request.author.trim().to_string(),
            category: request.category,
            language: request.language.trim().to_string(),
            description: request.description,
            cover_url: request.cover_url,
            book_file: request.book_file,
            private_book: request.private_book,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct CreateBookResponse {
    pub id: i64,
}

#[tracing::instrument(name = "[POST] books", skip_all)]
pub async fn store(
    State(app_state): State<SharedAppState>,
    Extension(user): Extension<Arc<User>>,
    axum::extract::Json(request): axum::extract::Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<CreateBookResponse>), Error> {
    request.validate().map_err(Error::Validation)?;

    let id = insert_book(&app_state.pool, user.id, &request.into()).await?;

    Ok((StatusCode::CREATED, Json(CreateBookResponse { id })))
}

#[tracing::instrument(name = "[GET] books/uploaded", skip_all)]
pub async fn uploaded(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<Vec<BookSummary>>, Error> {
    let books = BookQuery::new()
        .uploaded_by(user.id)
        .newest_first()
        .fetch_all(&app_state.pool)
        .await?;

    let summaries: Vec<BookSummary> = books.iter().map(BookSummary::from_book).collect();

    Ok(Json(surface.present(summaries)))
}
