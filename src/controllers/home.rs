use std::{borrow::Cow, collections::HashSet, sync::Arc};

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use validator::{ValidationError, ValidationErrors};

use crate::{
    db::{added_books::get_user_added_books, user::get_reminders},
    error::Error,
    library::{
        recommend::{AddedBookRef, Recommender},
        visibility::Viewer,
    },
    model::{BookSummary, Home, HomeBook, User},
    state::SharedAppState,
};

use super::Surface;

#[tracing::instrument(name = "[GET] /", skip_all)]
pub async fn index() -> &'static str {
    "Alive"
}

async fn recommend_books(
    app_state: &SharedAppState,
    surface: Surface,
    viewer: &Viewer,
    added: &[AddedBookRef],
    excluded: &HashSet<i64>,
) -> Result<Vec<BookSummary>, Error> {
    let library = &app_state.config.library;
    let recommender = Recommender::new(library.start_recommend);

    let books = recommender
        .recommend(
            &app_state.pool,
            viewer,
            added,
            surface.recommend_count(library),
            excluded,
        )
        .await?;

    Ok(books.iter().map(BookSummary::from_book).collect())
}

#[tracing::instrument(name = "[GET] home", skip_all)]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(user): Extension<Arc<User>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Home>, Error> {
    let added = get_user_added_books(&app_state.pool, user.id).await?;
    let refs: Vec<AddedBookRef> = added.iter().map(AddedBookRef::from).collect();

    let recommend_books =
        recommend_books(&app_state, surface, &viewer, &refs, &HashSet::new()).await?;

    let reminder = if app_state.reminder_counter.take_due(user.id) {
        let reminders = get_reminders(&app_state.pool, user.id).await?;
        let mut rng = rand::rng();
        let selected = match surface {
            Surface::Web => reminders.select(&mut rng),
            Surface::Mobile => reminders.select_api(&mut rng),
        };
        selected.map(str::to_string)
    } else {
        None
    };

    let home = Home {
        books: added.iter().map(HomeBook::from).collect(),
        recommend_books,
        reminder,
    };

    Ok(Json(surface.present(home)))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
pub struct RecommendQuery {
    #[serde(default)]
    exclude: Option<String>,
}

/// Parses a comma separated list of book ids such as `3,8,13`.
pub(crate) fn parse_excluded(raw: Option<&str>) -> Result<HashSet<i64>, ValidationErrors> {
    let Some(raw) = raw else {
        return Ok(HashSet::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "exclude",
                    ValidationError::new("exclude_format")
                        .with_message(Cow::from("Excluded ids must be integers")),
                );
                errors
            })
        })
        .collect()
}

/// Fresh recommendations, skipping the books the client already shows.
#[tracing::instrument(name = "[GET] home/recommendations", skip_all)]
pub async fn recommendations(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(user): Extension<Arc<User>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<BookSummary>>, Error> {
    let excluded = parse_excluded(query.exclude.as_deref()).map_err(Error::Validation)?;

    let added = get_user_added_books(&app_state.pool, user.id).await?;
    let refs: Vec<AddedBookRef> = added.iter().map(AddedBookRef::from).collect();

    let books = recommend_books(&app_state, surface, &viewer, &refs, &excluded).await?;

    Ok(Json(surface.present(books)))
}
