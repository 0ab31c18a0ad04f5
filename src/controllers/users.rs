use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    db::{added_books::get_user_added_books, error::DatabaseError, user::get_user_by_id_optional},
    error::Error,
    library::visibility::{Viewer, exclude_private},
    model::{AddedBook, BookSummary, Profile, User},
    state::SharedAppState,
};

use super::{Surface, UrlPath};

/// Builds the profile of `user` as `viewer` sees it: private books the viewer
/// may not open are left out of the reading list.
pub(crate) fn build_profile(viewer: &Viewer, user: User, added: Vec<AddedBook>) -> Profile {
    let books = exclude_private(viewer, added)
        .iter()
        .map(BookSummary::from)
        .collect();

    Profile {
        id: user.id,
        owner: viewer.user_id() == Some(user.id),
        username: user.username,
        books,
    }
}

#[tracing::instrument(name = "[GET] users/{id}", skip_all, fields(path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(viewer): Extension<Viewer>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Profile>, Error> {
    let user = get_user_by_id_optional(&app_state.pool, path.id)
        .await?
        .ok_or(Error::Database(DatabaseError::NotFound))?;

    let added = get_user_added_books(&app_state.pool, user.id).await?;

    Ok(Json(surface.present(build_profile(&viewer, user, added))))
}
