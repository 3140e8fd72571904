use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{AuthUser, Routes};
use crate::{
  entity::system_backup,
  prelude::*,
  state::AppState,
  sv::backup::{Created, NewBackup, Restored},
};

async fn list(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Vec<system_backup::Model>>> {
  Ok(Json(app.sv().backup.list(user.id).await?))
}

async fn create(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(input): Json<NewBackup>,
) -> Result<Json<Created>> {
  Ok(Json(app.sv().backup.create(&user, input).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupReq {
  backup_id: i32,
}

#[derive(Debug, Serialize)]
struct Deleted {
  success: bool,
  message: &'static str,
}

async fn delete(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<BackupReq>,
) -> Result<Json<Deleted>> {
  app.sv().backup.delete(user.id, req.backup_id).await?;
  Ok(Json(Deleted { success: true, message: "Backup deleted successfully" }))
}

async fn restore(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<BackupReq>,
) -> Result<Json<Restored>> {
  Ok(Json(app.sv().backup.restore(user.id, req.backup_id).await?))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/listBackups", get(list))
    .route("/createBackup", post(create))
    .route("/deleteBackup", post(delete))
    .route("/restoreBackup", post(restore))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn foreign_backup_is_forbidden() {
    let app = test_state().await;
    let (_, owner) = login(&app, "owner").await;
    let (_, intruder) = login(&app, "intruder").await;

    let (status, created) = post(
      &app,
      "/api/backups/createBackup",
      Some(&owner),
      json::json!({ "name": "Before cleanup" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["backupId"].as_i64().unwrap();

    let (status, body) = post(
      &app,
      "/api/backups/restoreBackup",
      Some(&intruder),
      json::json!({ "backupId": id }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = post(
      &app,
      "/api/backups/deleteBackup",
      Some(&owner),
      json::json!({ "backupId": id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = get(&app, "/api/backups/listBackups", Some(&owner)).await;
    assert!(list.as_array().unwrap().is_empty());
  }
}
