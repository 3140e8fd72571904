use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{AdminUser, Routes};
use crate::{
  entity::{LicenseTier, license_activation, license_key},
  prelude::*,
  state::AppState,
  sv::license::{Check, Device, Validation},
};

type Timestamp = chrono::DateTime<Utc>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateReq {
  license_key: String,
  device_id: String,
  user_email: Option<String>,
  user_name: Option<String>,
  installation_date: Timestamp,
}

async fn validate(
  State(app): State<Arc<AppState>>,
  Json(req): Json<ValidateReq>,
) -> Result<Json<Validation>> {
  if req.license_key.is_empty() || req.device_id.is_empty() {
    return Err(Error::InvalidArgs(
      "licenseKey and deviceId are required".into(),
    ));
  }

  let device = Device {
    id: &req.device_id,
    email: req.user_email,
    name: req.user_name,
    installation_date: req.installation_date.naive_utc(),
  };
  let validation = app.sv().license.validate(&req.license_key, device).await?;
  Ok(Json(validation))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckQuery {
  license_key: String,
  device_id: String,
}

async fn check(
  State(app): State<Arc<AppState>>,
  Query(query): Query<CheckQuery>,
) -> Result<Json<Check>> {
  Ok(Json(app.sv().license.check(&query.license_key, &query.device_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReq {
  tier: LicenseTier,
  #[serde(default = "one")]
  max_activations: i32,
  expires_at: Option<Timestamp>,
}

fn one() -> i32 {
  1
}

async fn generate(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Json(req): Json<GenerateReq>,
) -> Result<Json<license_key::Model>> {
  let license = app
    .sv()
    .license
    .generate(
      req.tier,
      req.max_activations,
      req.expires_at.map(|at| at.naive_utc()),
    )
    .await?;
  Ok(Json(license))
}

async fn list(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
) -> Result<Json<Vec<license_key::Model>>> {
  Ok(Json(app.sv().license.all().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivationsQuery {
  license_key_id: i32,
}

async fn activations(
  State(app): State<Arc<AppState>>,
  _: AdminUser,
  Query(query): Query<ActivationsQuery>,
) -> Result<Json<Vec<license_activation::Model>>> {
  Ok(Json(app.sv().license.activations(query.license_key_id).await?))
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/validateLicense", post(validate))
    .route("/checkLicense", get(check))
    .route("/generateLicense", post(generate))
    .route("/listLicenses", get(list))
    .route("/listActivations", get(activations))
}
