//! Pass-through to the hosted admin dashboard.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::Routes;
use crate::{
  dashboard::{ActivateLicense, RegisterUser, TrackUsage},
  prelude::*,
  state::AppState,
};

type Value = Json<json::Value>;

async fn register_user(
  State(app): State<Arc<AppState>>,
  Json(input): Json<RegisterUser>,
) -> Result<Value> {
  Ok(Json(app.dashboard.register_user(input).await?))
}

async fn activate_license(
  State(app): State<Arc<AppState>>,
  Json(input): Json<ActivateLicense>,
) -> Result<Value> {
  Ok(Json(app.dashboard.activate_license(input).await?))
}

#[derive(Debug, Serialize)]
struct Tracked {
  success: bool,
}

async fn track_usage(
  State(app): State<Arc<AppState>>,
  Json(input): Json<TrackUsage>,
) -> Json<Tracked> {
  Json(Tracked { success: app.dashboard.track_usage(input).await })
}

async fn feature_flags(State(app): State<Arc<AppState>>) -> Value {
  Json(app.dashboard.feature_flags().await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatesQuery {
  current_version: String,
}

async fn check_updates(
  State(app): State<Arc<AppState>>,
  Query(query): Query<UpdatesQuery>,
) -> Value {
  Json(app.dashboard.check_updates(&query.current_version).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsQuery {
  user_email: String,
}

async fn notifications(
  State(app): State<Arc<AppState>>,
  Query(query): Query<NotificationsQuery>,
) -> Value {
  Json(app.dashboard.notifications(&query.user_email).await)
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/registerUser", post(register_user))
    .route("/activateLicense", post(activate_license))
    .route("/trackUsage", post(track_usage))
    .route("/getFeatureFlags", get(feature_flags))
    .route("/checkUpdates", get(check_updates))
    .route("/getNotifications", get(notifications))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn unconfigured_dashboard_degrades() {
    let app = test_state().await;

    let (status, flags) =
      get(&app, "/api/admin-dashboard/getFeatureFlags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flags, json::json!([]));

    let (_, tracked) = post(
      &app,
      "/api/admin-dashboard/trackUsage",
      None,
      json::json!({ "userEmail": "ann@example.com", "action": "app_opened" }),
    )
    .await;
    assert_eq!(tracked["success"], false);

    let (status, _) = post(
      &app,
      "/api/admin-dashboard/registerUser",
      None,
      json::json!({ "email": "ann@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
