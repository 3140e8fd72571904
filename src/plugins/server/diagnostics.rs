use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  routing::{get, post},
};
use serde::Deserialize;

use super::{AuthUser, Routes};
use crate::{
  diagnostics,
  entity::system_scan::{self, ScanType},
  prelude::*,
  state::AppState,
  sv::scan::Outcome,
};

type Value = Json<json::Value>;

async fn system_overview() -> Value {
  Json(diagnostics::system_overview())
}

async fn startup_programs() -> Value {
  Json(diagnostics::startup_programs())
}

async fn running_processes() -> Value {
  Json(diagnostics::running_processes())
}

async fn driver_status(_: AuthUser) -> Value {
  Json(diagnostics::driver_status())
}

async fn security_status() -> Value {
  Json(diagnostics::security_status())
}

async fn performance_bottlenecks() -> Value {
  Json(diagnostics::performance_bottlenecks())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanReq {
  #[serde(default = "full")]
  scan_type: ScanType,
}

fn full() -> ScanType {
  ScanType::Full
}

async fn run_full_scan(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<ScanReq>,
) -> Result<Json<Outcome>> {
  Ok(Json(app.sv().scan.run(user.id, req.scan_type).await?))
}

async fn scan_history(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Vec<system_scan::Model>>> {
  Ok(Json(app.sv().scan.history(user.id).await?))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getSystemOverview", get(system_overview))
    .route("/getStartupPrograms", get(startup_programs))
    .route("/getRunningProcesses", get(running_processes))
    .route("/getDriverStatus", get(driver_status))
    .route("/getSecurityStatus", get(security_status))
    .route("/getPerformanceBottlenecks", get(performance_bottlenecks))
    .route("/runFullScan", post(run_full_scan))
    .route("/getScanHistory", get(scan_history))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn scan_is_recorded() {
    let app = test_state().await;
    let (_, token) = login(&app, "scanner").await;

    let (status, outcome) = post(
      &app,
      "/api/diagnostics/runFullScan",
      Some(&token),
      json::json!({ "scanType": "quick" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "completed");

    let (_, history) =
      get(&app, "/api/diagnostics/getScanHistory", Some(&token)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["scanType"], "quick");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn public_overview_needs_no_login() {
    let app = test_state().await;
    let (status, _) = get(&app, "/api/diagnostics/getSystemOverview", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/api/diagnostics/getDriverStatus", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }
}
