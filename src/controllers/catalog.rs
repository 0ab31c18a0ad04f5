use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::{
    db::{
        books::BookQuery,
        catalog::{get_authors_list, get_categories, get_category_by_id, get_languages},
    },
    error::Error,
    library::{
        pagination::{Page, paginate},
        sort::{SortCriterion, sort_books},
        visibility::{ExcludePrivate, Viewer},
    },
    model::{BookSummary, Category, Language},
    state::SharedAppState,
};

use super::{ListQuery, Surface, UrlPath};

#[tracing::instrument(name = "[GET] categories", skip_all)]
pub async fn categories(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
) -> Result<Json<Vec<Category>>, Error> {
    let categories = get_categories(&app_state.pool).await?;

    Ok(Json(surface.present(categories)))
}

#[tracing::instrument(name = "[GET] categories/{id}/books", skip_all, fields(path.id))]
pub async fn category_books(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(viewer): Extension<Viewer>,
    Path(path): Path<UrlPath>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<BookSummary>>, Error> {
    query.validate().map_err(Error::Validation)?;

    get_category_by_id(&app_state.pool, path.id).await?;

    let books = BookQuery::new()
        .category(path.id)
        .exclude_private(&viewer)
        .fetch_all(&app_state.pool)
        .await?;

    let sorted = sort_books(&viewer, books, query.criterion);
    let page = paginate(
        sorted,
        surface.page_size(&app_state.config.library),
        query.page(),
    );

    Ok(Json(surface.present(page)))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 100))]
    q: String,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 1))]
    page: Option<usize>,

    #[serde(default)]
    criterion: SortCriterion,
}

#[tracing::instrument(name = "[GET] books/search", skip_all)]
pub async fn search(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<BookSummary>>, Error> {
    query.validate().map_err(Error::Validation)?;

    let books = BookQuery::new()
        .search(query.q.trim())
        .exclude_private(&viewer)
        .fetch_all(&app_state.pool)
        .await?;

    let sorted = sort_books(&viewer, books, query.criterion);
    let page = paginate(
        sorted,
        surface.page_size(&app_state.config.library),
        query.page.unwrap_or(1),
    );

    Ok(Json(surface.present(page)))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct AuthorsQuery {
    #[validate(length(min = 1, max = 100))]
    part: String,
}

#[tracing::instrument(name = "[GET] authors", skip_all)]
pub async fn authors(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Query(query): Query<AuthorsQuery>,
) -> Result<Json<Vec<String>>, Error> {
    query.validate().map_err(Error::Validation)?;

    let authors = get_authors_list(&app_state.pool, &query.part).await?;

    Ok(Json(surface.present(authors)))
}

#[tracing::instrument(name = "[GET] languages", skip_all)]
pub async fn languages(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
) -> Result<Json<Vec<Language>>, Error> {
    let languages = get_languages(&app_state.pool).await?;

    Ok(Json(surface.present(languages)))
}
