use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  routing::{get, post},
};
use serde::Deserialize;
use teloxide::utils::html;

use super::{AuthUser, Done, Routes, done};
use crate::{
  dashboard::{RegisterUser, TrackUsage},
  prelude::*,
  state::AppState,
  sv::user::{RegistrationStatus, Usage},
};

#[derive(Debug, Deserialize)]
struct RegisterReq {
  name: String,
  email: String,
  phone: String,
}

async fn register(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<RegisterReq>,
) -> Result<Json<Done>> {
  let user = app
    .sv()
    .user
    .register(user.id, req.name, req.email.clone(), req.phone.clone())
    .await?;

  let mirror = RegisterUser {
    email: req.email,
    username: user.name.clone(),
    phone: Some(req.phone),
    plan_type: None,
  };
  if let Err(err) = app.dashboard.register_user(mirror).await {
    warn!("User {} registered locally only: {err}", user.id);
  }

  app
    .notify_admins(&format!(
      "✅ New registration: {}",
      html::escape(user.display_name())
    ))
    .await;
  Ok(done())
}

async fn track_usage(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Usage>> {
  let usage = app.sv().user.track_usage(user.id).await?;

  if let Some(email) = user.email {
    app
      .dashboard
      .track_usage(TrackUsage {
        user_email: email,
        action: "app_opened".into(),
        metadata: json::json!({ "usageCount": usage.usage_count }),
      })
      .await;
  }

  Ok(Json(usage))
}

async fn registration_status(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<RegistrationStatus>> {
  Ok(Json(app.sv().user.registration_status(user.id).await?))
}

async fn update_last_notification(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Done>> {
  app.sv().user.touch_notification(user.id).await?;
  Ok(done())
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/register", post(register))
    .route("/trackUsage", post(track_usage))
    .route("/getRegistrationStatus", get(registration_status))
    .route("/updateLastNotification", post(update_last_notification))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn prompt_then_register() {
    let app = test_state().await;
    let (_, token) = login(&app, "newcomer").await;

    let (_, first) =
      post(&app, "/api/user/trackUsage", Some(&token), json::json!({})).await;
    assert_eq!(first["shouldShowRegistration"], false);
    let (_, second) =
      post(&app, "/api/user/trackUsage", Some(&token), json::json!({})).await;
    assert_eq!(second["usageCount"], 2);
    assert_eq!(second["shouldShowRegistration"], true);

    let (status, body) = post(
      &app,
      "/api/user/register",
      Some(&token),
      json::json!({ "name": "Ann", "email": "not-an-email", "phone": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");

    // the dashboard is not configured, registration still succeeds
    let (status, _) = post(
      &app,
      "/api/user/register",
      Some(&token),
      json::json!({ "name": "Ann", "email": "ann@example.com", "phone": "555" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, registration) =
      get(&app, "/api/user/getRegistrationStatus", Some(&token)).await;
    assert_eq!(registration["isRegistered"], true);
    assert_eq!(registration["shouldShowRegistration"], false);
  }
}
