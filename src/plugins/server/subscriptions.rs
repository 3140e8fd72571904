use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::Deserialize;
use teloxide::utils::html;

use super::{AuthUser, Done, Routes, done};
use crate::{
  prelude::*,
  state::AppState,
  sv::subscription::{
    self, Activated, Current, FeatureAccess, Pricing, TrialStarted,
  },
};

async fn pricing() -> Json<Pricing> {
  Json(subscription::pricing())
}

async fn mine(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Current>> {
  Ok(Json(app.sv().subscription.current(user.id).await?))
}

async fn start_trial(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<TrialStarted>> {
  let started = app.sv().subscription.start_trial(user.id).await?;
  app
    .notify_admins(&format!(
      "🎁 {} started a free trial (until {})",
      html::escape(user.display_name()),
      utils::format_date(started.trial_ends_at)
    ))
    .await;
  Ok(Json(started))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivateReq {
  license_key: String,
}

async fn activate(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<ActivateReq>,
) -> Result<Json<Activated>> {
  let key = req.license_key.trim();
  let activated = app.sv().subscription.activate(user.id, key).await?;

  if let Some(email) = user.email.clone() {
    let input = crate::dashboard::ActivateLicense {
      license_key: key.to_string(),
      device_id: format!("user-{}", user.id),
      user_email: email,
    };
    // mirrored best effort, the local activation already succeeded
    let _ = app.dashboard.activate_license(input).await;
  }

  Ok(Json(activated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureQuery {
  feature_key: String,
}

async fn feature_access(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Query(query): Query<FeatureQuery>,
) -> Result<Json<FeatureAccess>> {
  let access = app
    .sv()
    .subscription
    .check_feature_access(user.id, &query.feature_key)
    .await?;
  Ok(Json(access))
}

async fn cancel(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Done>> {
  app.sv().subscription.cancel(user.id).await?;
  Ok(done())
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getPricing", get(pricing))
    .route("/getMySubscription", get(mine))
    .route("/startTrial", post(start_trial))
    .route("/activateLicense", post(activate))
    .route("/checkFeatureAccess", get(feature_access))
    .route("/cancelSubscription", post(cancel))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn trial_flow() {
    let app = test_state().await;
    let (_, token) = login(&app, "trialist").await;

    let (_, current) =
      get(&app, "/api/subscriptions/getMySubscription", Some(&token)).await;
    assert_eq!(current["tier"], "free");
    assert_eq!(current["canStartTrial"], true);

    let (status, _) =
      post(&app, "/api/subscriptions/startTrial", Some(&token), json::json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
      post(&app, "/api/subscriptions/startTrial", Some(&token), json::json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already used your free trial");

    let (_, access) = get(
      &app,
      "/api/subscriptions/checkFeatureAccess?featureKey=speed-boost",
      Some(&token),
    )
    .await;
    assert_eq!(access["hasAccess"], true);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn pricing_is_public() {
    let app = test_state().await;
    let (status, body) = get(&app, "/api/subscriptions/getPricing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tiers"].as_array().unwrap().len(), 6);
  }
}
