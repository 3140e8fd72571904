use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{AuthUser, Done, Routes, done};
use crate::{
  entity::performance_snapshot::{self, SnapshotType},
  prelude::*,
  state::AppState,
  sv::metrics::{Comparison, Sample},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptureReq {
  fix_type: String,
  #[serde(default)]
  metrics: Sample,
}

async fn capture(
  app: &AppState,
  user_id: i32,
  snapshot_type: SnapshotType,
  req: CaptureReq,
) -> Result<Json<Done>> {
  app
    .sv()
    .metrics
    .capture(user_id, snapshot_type, &req.fix_type, req.metrics)
    .await?;
  Ok(done())
}

async fn before(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<CaptureReq>,
) -> Result<Json<Done>> {
  capture(&app, user.id, SnapshotType::BeforeFix, req).await
}

async fn after(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<CaptureReq>,
) -> Result<Json<Done>> {
  capture(&app, user.id, SnapshotType::AfterFix, req).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonQuery {
  fix_type: Option<String>,
}

async fn comparison(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Query(query): Query<ComparisonQuery>,
) -> Result<Json<Comparison>> {
  let comparison = app
    .sv()
    .metrics
    .comparison(user.id, query.fix_type.as_deref())
    .await?;
  Ok(Json(comparison))
}

#[derive(Debug, Serialize)]
struct History {
  snapshots: Vec<performance_snapshot::Model>,
}

async fn history(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<History>> {
  let snapshots = app.sv().metrics.history(user.id).await?;
  Ok(Json(History { snapshots }))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/captureBeforeSnapshot", post(before))
    .route("/captureAfterSnapshot", post(after))
    .route("/getPerformanceComparison", get(comparison))
    .route("/getPerformanceHistory", get(history))
}
