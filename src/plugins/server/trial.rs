use axum::{Json, routing::post};
use serde::{Deserialize, Serialize};

use super::Routes;
use crate::{
  prelude::*,
  trial::{self, InstallState, TrialStatus},
};

async fn status(Json(state): Json<InstallState>) -> Json<TrialStatus> {
  Json(trial::evaluate(&state, Utc::now().naive_utc()))
}

#[derive(Debug, Deserialize)]
struct FeatureReq {
  #[serde(flatten)]
  state: InstallState,
  feature: String,
}

#[derive(Debug, Serialize)]
struct FeatureLock {
  locked: bool,
}

async fn feature_locked(Json(req): Json<FeatureReq>) -> Json<FeatureLock> {
  let status = trial::evaluate(&req.state, Utc::now().naive_utc());
  Json(FeatureLock { locked: trial::is_feature_locked(&status, &req.feature) })
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/status", post(status))
    .route("/isFeatureLocked", post(feature_locked))
}
