use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{AdminUser, AuthUser, Done, Routes, done};
use crate::{
  entity::{
    Role, app_settings,
    app_update::{self, ReleaseType},
    feature_flag, license_key,
  },
  prelude::*,
  state::AppState,
  sv::admin::{
    FlagPatch, Generated, KeyBatch, NewFlag, NewRelease, ReleasePatch,
    SettingsInput, Stats, UserRow,
  },
};

#[derive(Debug, Deserialize)]
struct ById {
  id: i32,
}

fn default_limit() -> u64 {
  50
}

async fn flags(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
) -> Result<Json<Vec<feature_flag::Model>>> {
  Ok(Json(app.sv().admin.flags().await?))
}

async fn create_flag(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(input): Json<NewFlag>,
) -> Result<Json<feature_flag::Model>> {
  Ok(Json(app.sv().admin.create_flag(input).await?))
}

async fn update_flag(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(patch): Json<FlagPatch>,
) -> Result<Json<feature_flag::Model>> {
  Ok(Json(app.sv().admin.update_flag(patch).await?))
}

async fn delete_flag(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(req): Json<ById>,
) -> Result<Json<Done>> {
  app.sv().admin.delete_flag(req.id).await?;
  Ok(done())
}

async fn releases(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
) -> Result<Json<Vec<app_update::Model>>> {
  Ok(Json(app.sv().admin.releases().await?))
}

async fn create_release(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(input): Json<NewRelease>,
) -> Result<Json<app_update::Model>> {
  Ok(Json(app.sv().admin.create_release(input).await?))
}

async fn update_release(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(patch): Json<ReleasePatch>,
) -> Result<Json<app_update::Model>> {
  Ok(Json(app.sv().admin.update_release(patch).await?))
}

async fn delete_release(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(req): Json<ById>,
) -> Result<Json<Done>> {
  app.sv().admin.delete_release(req.id).await?;
  Ok(done())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestQuery {
  release_type: Option<ReleaseType>,
}

// any signed-in user may ask for the latest release
async fn latest_release(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
  Query(query): Query<LatestQuery>,
) -> Result<Json<Option<app_update::Model>>> {
  Ok(Json(app.sv().admin.latest_release(query.release_type).await?))
}

#[derive(Debug, Deserialize)]
struct LicenseQuery {
  status: Option<license_key::Status>,
  #[serde(default = "default_limit")]
  limit: u64,
}

async fn licenses(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Query(query): Query<LicenseQuery>,
) -> Result<Json<Vec<license_key::Model>>> {
  Ok(Json(app.sv().admin.licenses(query.status, query.limit).await?))
}

async fn generate_keys(
  State(app): State<Arc<AppState>>,
  AdminUser(admin): AdminUser,
  Json(batch): Json<KeyBatch>,
) -> Result<Json<Generated>> {
  let generated = app.sv().admin.generate_keys(batch).await?;
  info!("Admin {} generated {} license keys", admin.id, generated.generated);
  Ok(Json(generated))
}

async fn revoke_key(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(req): Json<ById>,
) -> Result<Json<Done>> {
  app.sv().admin.revoke_key(req.id).await?;
  Ok(done())
}

#[derive(Debug, Deserialize)]
struct Page {
  #[serde(default = "default_limit")]
  limit: u64,
  #[serde(default)]
  offset: u64,
}

async fn users(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Query(page): Query<Page>,
) -> Result<Json<Vec<UserRow>>> {
  Ok(Json(app.sv().admin.users(page.limit, page.offset).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleReq {
  user_id: i32,
  role: Role,
}

async fn update_role(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(req): Json<RoleReq>,
) -> Result<Json<Done>> {
  app.sv().admin.update_role(req.user_id, req.role).await?;
  Ok(done())
}

async fn stats(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
) -> Result<Json<Stats>> {
  Ok(Json(app.sv().admin.stats().await?))
}

async fn settings(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
) -> Result<Json<app_settings::Model>> {
  Ok(Json(app.sv().admin.settings().await?))
}

async fn update_settings(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(input): Json<SettingsInput>,
) -> Result<Json<app_settings::Model>> {
  Ok(Json(app.sv().admin.update_settings(input).await?))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/featureFlags/list", get(flags))
    .route("/featureFlags/create", post(create_flag))
    .route("/featureFlags/update", post(update_flag))
    .route("/featureFlags/delete", post(delete_flag))
    .route("/updates/list", get(releases))
    .route("/updates/create", post(create_release))
    .route("/updates/update", post(update_release))
    .route("/updates/delete", post(delete_release))
    .route("/updates/getLatest", get(latest_release))
    .route("/licenses/list", get(licenses))
    .route("/licenses/generate", post(generate_keys))
    .route("/licenses/revoke", post(revoke_key))
    .route("/users/list", get(users))
    .route("/users/updateRole", post(update_role))
    .route("/users/getStats", get(stats))
    .route("/getSettings", get(settings))
    .route("/updateSettings", post(update_settings))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn generated_keys_activate_subscriptions() {
    let app = test_state().await;
    let admin = login_admin(&app, "admin").await;
    let (_, token) = login(&app, "buyer").await;

    let (status, generated) = post(
      &app,
      "/api/admin/licenses/generate",
      Some(&admin),
      json::json!({ "count": 2, "tier": "pro", "expiresInDays": 30 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["generated"], 2);
    let key = generated["keys"][0].as_str().unwrap().to_string();
    assert!(key.starts_with("FM-"));

    let (status, activated) = post(
      &app,
      "/api/subscriptions/activateLicense",
      Some(&token),
      json::json!({ "licenseKey": key }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["tier"], "pro");

    let (_, stats) = get(&app, "/api/admin/users/getStats", Some(&admin)).await;
    assert_eq!(stats["proUsers"], 1);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn license_list_limit_is_validated() {
    let app = test_state().await;
    let admin = login_admin(&app, "admin").await;

    let (status, _) =
      get(&app, "/api/admin/licenses/list?limit=500", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
      get(&app, "/api/admin/licenses/list?status=active", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
  }
}
