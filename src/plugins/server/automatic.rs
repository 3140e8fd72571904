use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  routing::{get, post},
};

use super::{AuthUser, Done, Routes, done};
use crate::{prelude::*, state::AppState, sv::automatic::Settings};

async fn settings(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Settings>> {
  Ok(Json(app.sv().automatic.settings(user.id).await?))
}

async fn save(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(input): Json<Settings>,
) -> Result<Json<Done>> {
  let saved = app.sv().automatic.save(user.id, input).await?;
  app
    .scheduler
    .update(user.id, saved.schedule_enabled, &saved.schedule_frequency)
    .await?;
  Ok(done())
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getSettings", get(settings))
    .route("/saveSettings", post(save))
}
