use axum::{
  Json,
  routing::{get, post},
};
use serde::Deserialize;

use super::{Done, Routes, done};
use crate::{prelude::*, system};

async fn blocking<T: Send + 'static>(
  task: impl FnOnce() -> T + Send + 'static,
) -> Result<T> {
  tokio::task::spawn_blocking(task)
    .await
    .map_err(|err| Error::Internal(err.to_string()))
}

async fn processes() -> Result<Json<Vec<system::Process>>> {
  Ok(Json(blocking(system::processes).await?))
}

async fn summary() -> Result<Json<system::Summary>> {
  Ok(Json(blocking(system::summary).await?))
}

#[derive(Debug, Deserialize)]
struct EndReq {
  pid: u32,
}

async fn end_process(Json(req): Json<EndReq>) -> Result<Json<Done>> {
  let pid = req.pid;
  if !blocking(move || system::kill(pid)).await? {
    warn!("Failed to end process {pid}");
    return Err(Error::Rejected("Failed to end process".into()));
  }
  info!("Ended process {pid}");
  Ok(done())
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/getProcesses", get(processes))
    .route("/getSystemSummary", get(summary))
    .route("/endProcess", post(end_process))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::state::tests::test_state;

  #[tokio::test(flavor = "multi_thread")]
  async fn unknown_pid_fails() {
    let app = test_state().await;
    let (status, body) = post(
      &app,
      "/api/processes/endProcess",
      None,
      json::json!({ "pid": u32::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to end process");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn process_list_is_served() {
    let app = test_state().await;
    let (status, body) = get(&app, "/api/processes/getProcesses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());
  }
}
