use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::get,
};
use serde::Deserialize;

use super::Routes;
use crate::{
  prelude::*,
  state::AppState,
  sv::updates::{Latest, UpdateCheck, VersionInfo},
};

async fn latest(State(app): State<Arc<AppState>>) -> Result<Json<Latest>> {
  Ok(Json(app.sv().updates.latest_version().await?))
}

async fn current(State(app): State<Arc<AppState>>) -> Json<VersionInfo> {
  Json(app.sv().updates.current_version().await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckQuery {
  current_version: String,
}

async fn check(
  State(app): State<Arc<AppState>>,
  Query(query): Query<CheckQuery>,
) -> Result<Json<UpdateCheck>> {
  Ok(Json(app.sv().updates.check(&query.current_version).await?))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getLatestVersion", get(latest))
    .route("/getCurrentVersion", get(current))
    .route("/checkForUpdates", get(check))
}
