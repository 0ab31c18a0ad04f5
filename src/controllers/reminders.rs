use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use crate::{
    db::user::{get_reminders, set_reminder},
    error::Error,
    library::reminders::{ApiReminders, Reminders, WebReminders},
    model::User,
    state::SharedAppState,
};

use super::Surface;

#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ReminderSettings {
    Web(WebReminders),
    Mobile(ApiReminders),
}

impl ReminderSettings {
    fn view(surface: Surface, reminders: &Reminders) -> Self {
        match surface {
            Surface::Web => ReminderSettings::Web(reminders.web()),
            Surface::Mobile => ReminderSettings::Mobile(reminders.api()),
        }
    }
}

#[tracing::instrument(name = "[GET] reminders", skip_all)]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<ReminderSettings>, Error> {
    let reminders = get_reminders(&app_state.pool, user.id).await?;

    Ok(Json(ReminderSettings::view(surface, &reminders)))
}

#[derive(serde::Deserialize, serde::Serialize, Debug)]
pub struct UpdateReminderRequest {
    pub field: String,
    pub value: bool,
}

#[tracing::instrument(name = "[PUT] reminders", skip_all)]
pub async fn update(
    State(app_state): State<SharedAppState>,
    Extension(surface): Extension<Surface>,
    Extension(user): Extension<Arc<User>>,
    axum::extract::Json(request): axum::extract::Json<UpdateReminderRequest>,
) -> Result<Json<ReminderSettings>, Error> {
    let field = Reminders::field(&request.field)?;
    let reminders = set_reminder(&app_state.pool, user.id, field, request.value).await?;

    Ok(Json(ReminderSettings::view(surface, &reminders)))
}
