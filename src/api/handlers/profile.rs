//! Profile endpoints shared by every staff area

use crate::api::extract::CurrentUser;
use crate::application::profile::{self, ProfileSaved, ProfileUpdate, ProfileView, Supervisor};
use crate::application::AppState;
use crate::error::Result;
use axum::extract::State;
use axum::Json;

pub async fn show(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<ProfileView>> {
    Ok(Json(profile::profile(&state, &user).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileSaved>> {
    Ok(Json(profile::update_profile(&state, user, update).await?))
}

pub async fn supervisors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Supervisor>>> {
    Ok(Json(profile::supervisors(&state, &user).await?))
}
