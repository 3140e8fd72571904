use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{AuthUser, Done, Routes, done};
use crate::{entity::startup_program, prelude::*, state::AppState};

async fn programs(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
) -> Result<Json<Vec<startup_program::Model>>> {
  Ok(Json(app.sv().startup.all().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleReq {
  program_id: i32,
  enabled: bool,
}

async fn toggle(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
  Json(req): Json<ToggleReq>,
) -> Result<Json<Done>> {
  app.sv().startup.toggle(req.program_id, req.enabled).await?;
  Ok(done())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramQuery {
  program_id: i32,
}

async fn program(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
  Query(query): Query<ProgramQuery>,
) -> Result<Json<Option<startup_program::Model>>> {
  Ok(Json(app.sv().startup.by_id(query.program_id).await?))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getPrograms", get(programs))
    .route("/toggleProgram", post(toggle))
    .route("/getProgram", get(program))
}
