use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  routing::{get, post},
};
use serde::Deserialize;

use super::{AuthUser, Routes};
use crate::{prelude::*, state::AppState, sv::fix::Outcome};

#[derive(Debug, Deserialize)]
struct IssueReq {
  issue: String,
}

async fn performance_issue(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
  Json(req): Json<IssueReq>,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().fix.performance_issue(&req.issue).await?))
}

async fn windows_updates(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().fix.windows_updates(user.id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramsReq {
  program_ids: Vec<String>,
}

async fn startup_programs(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<ProgramsReq>,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().fix.startup_programs(user.id, &req.program_ids).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriversReq {
  driver_ids: Vec<String>,
}

async fn drivers(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<DriversReq>,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().fix.drivers(user.id, &req.driver_ids).await?))
}

async fn security(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().fix.security(user.id).await?))
}

async fn all(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().fix.all(user.id).await?))
}

async fn history(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
) -> Json<json::Value> {
  Json(app.sv().fix.history())
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/fixPerformanceIssue", post(performance_issue))
    .route("/fixWindowsUpdates", post(windows_updates))
    .route("/optimizeStartupPrograms", post(startup_programs))
    .route("/updateDrivers", post(drivers))
    .route("/fixSecurityIssues", post(security))
    .route("/fixAllIssues", post(all))
    .route("/getFixHistory", get(history))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn premium_fixes_are_gated() {
    let app = test_state().await;
    let (_, token) = login(&app, "fixer").await;

    let (status, body) =
      post(&app, "/api/fixes/fixSecurityIssues", Some(&token), json::json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = post(
      &app,
      "/api/fixes/fixPerformanceIssue",
      Some(&token),
      json::json!({ "issue": "Temp files" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Fixed: Temp files");

    post(&app, "/api/subscriptions/startTrial", Some(&token), json::json!({}))
      .await;
    let (status, _) =
      post(&app, "/api/fixes/fixSecurityIssues", Some(&token), json::json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
  }
}
