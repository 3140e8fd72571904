use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{AuthUser, Routes};
use crate::{
  dashboard::TrackUsage,
  optimizer::{Category, Cleaned, DetailedItems, Diagnostics, Run},
  prelude::*,
  state::AppState,
  system,
};

async fn metrics() -> Result<Json<system::Metrics>> {
  let metrics = tokio::task::spawn_blocking(system::metrics)
    .await
    .map_err(|err| Error::Internal(err.to_string()))?;
  Ok(Json(metrics))
}

async fn diagnostics(State(app): State<Arc<AppState>>) -> Json<Diagnostics> {
  Json(app.optimizer.diagnostics())
}

#[derive(Debug, Deserialize)]
struct CategoryQuery {
  category: String,
}

async fn detailed_items(
  State(app): State<Arc<AppState>>,
  Query(query): Query<CategoryQuery>,
) -> Result<Json<DetailedItems>> {
  let category: Category = query.category.parse()?;
  Ok(Json(app.optimizer.detailed_items(category)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectiveReq {
  category: String,
  item_ids: Vec<String>,
}

async fn selective(
  State(app): State<Arc<AppState>>,
  Json(req): Json<SelectiveReq>,
) -> Result<Json<Cleaned>> {
  let category: Category = req.category.parse()?;
  time::sleep(app.config.fix_delay * 2).await;
  Ok(Json(app.optimizer.clean_selected(category, &req.item_ids)))
}

async fn execute(
  State(app): State<Arc<AppState>>,
  user: Option<AuthUser>,
) -> Json<Run> {
  time::sleep(app.config.fix_delay).await;
  let run = app.optimizer.run_full();

  if let Some(AuthUser(user)) = user
    && let Some(email) = user.email
  {
    let event = TrackUsage {
      user_email: email,
      action: "optimization_run".into(),
      metadata: json::json!({
        "itemsCleaned": run.summary.total_items_cleaned,
        "spaceFreed": run.summary.total_space_freed,
        "timestamp": Utc::now().to_rfc3339(),
      }),
    };
    let app = app.clone();
    tokio::spawn(async move { app.dashboard.track_usage(event).await });
  }

  Json(run)
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getMetrics", get(metrics))
    .route("/getDiagnostics", get(diagnostics))
    .route("/getDetailedItems", get(detailed_items))
    .route("/executeSelectiveOptimization", post(selective))
    .route("/executeOptimization", post(execute))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn cleaned_items_disappear() {
    let app = test_state().await;

    let (status, items) =
      get(&app, "/api/optimizer/getDetailedItems?category=files", None).await;
    assert_eq!(status, StatusCode::OK);
    let first = items["items"][0]["id"].as_str().unwrap().to_string();

    let (status, cleaned) = post(
      &app,
      "/api/optimizer/executeSelectiveOptimization",
      None,
      json::json!({ "category": "files", "itemIds": [first.clone()] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleaned["itemsCleaned"], 1);

    let (_, again) =
      get(&app, "/api/optimizer/getDetailedItems?category=files", None).await;
    let ids: Vec<&str> = again["items"]
      .as_array()
      .unwrap()
      .iter()
      .filter_map(|item| item["id"].as_str())
      .collect();
    assert!(!ids.contains(&first.as_str()));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn unknown_category_is_rejected() {
    let app = test_state().await;
    let (status, body) =
      get(&app, "/api/optimizer/getDetailedItems?category=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown category: nope");
  }
}
