//! Client for the external admin dashboard.
//!
//! The dashboard speaks a tRPC-style envelope: inputs travel as
//! `{"json": ..}` and results come back under `result.data.json`.
//! Registration and activation surface failures to the caller; tracking,
//! flags, update checks and notifications never fail the caller.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
  pub email: String,
  pub username: Option<String>,
  pub phone: Option<String>,
  pub plan_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateLicense {
  pub license_key: String,
  pub device_id: String,
  pub user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUsage {
  pub user_email: String,
  pub action: String,
  #[serde(default)]
  pub metadata: json::Value,
}

fn unwrap_envelope(body: json::Value) -> json::Value {
  match body.pointer("/result/data/json") {
    Some(inner) if !inner.is_null() => inner.clone(),
    _ => body,
  }
}

pub struct Client {
  http: reqwest::Client,
  base_url: Option<String>,
}

impl Client {
  pub fn new(base_url: Option<String>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()?;
    let base_url = base_url.map(|url| url.trim_end_matches('/').to_string());
    Ok(Self { http, base_url })
  }

  fn url(&self, procedure: &str) -> Result<String> {
    let base = self.base_url.as_deref().ok_or_else(|| {
      Error::Rejected("Admin dashboard is not configured".into())
    })?;
    Ok(format!("{base}/api.{procedure}"))
  }

  async fn mutate(
    &self,
    procedure: &str,
    input: impl Serialize,
  ) -> Result<json::Value> {
    let body = json::json!({ "json": input });
    let response: json::Value = self
      .http
      .post(self.url(procedure)?)
      .json(&body)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(unwrap_envelope(response))
  }

  async fn query(
    &self,
    procedure: &str,
    input: Option<json::Value>,
  ) -> Result<json::Value> {
    let mut request = self.http.get(self.url(procedure)?);
    if let Some(input) = input {
      let encoded = json::to_string(&json::json!({ "json": input }))?;
      request = request.query(&[("input", encoded)]);
    }

    let response: json::Value =
      request.send().await?.error_for_status()?.json().await?;
    Ok(unwrap_envelope(response))
  }

  pub async fn register_user(
    &self,
    mut input: RegisterUser,
  ) -> Result<json::Value> {
    if input.username.is_none() {
      input.username = input.email.split('@').next().map(str::to_string);
    }
    input.plan_type.get_or_insert_with(|| "free".into());

    self.mutate("registerUser", input).await.inspect_err(|err| {
      error!("Admin dashboard registration failed: {err}");
    })
  }

  pub async fn activate_license(
    &self,
    input: ActivateLicense,
  ) -> Result<json::Value> {
    self.mutate("activateLicense", input).await.inspect_err(|err| {
      error!("Admin dashboard license activation failed: {err}");
    })
  }

  /// Best effort; returns whether the dashboard accepted the event.
  pub async fn track_usage(&self, input: TrackUsage) -> bool {
    if self.base_url.is_none() {
      return false;
    }
    match self.mutate("trackUsage", input).await {
      Ok(_) => true,
      Err(err) => {
        warn!("Usage tracking failed: {err}");
        false
      }
    }
  }

  pub async fn feature_flags(&self) -> json::Value {
    self.query("getFeatureFlags", None).await.unwrap_or_else(|err| {
      warn!("Fetching feature flags failed: {err}");
      json::json!([])
    })
  }

  pub async fn check_updates(&self, current_version: &str) -> json::Value {
    let input = json::json!({ "currentVersion": current_version });
    self.query("checkUpdates", Some(input)).await.unwrap_or_else(|err| {
      warn!("Dashboard update check failed: {err}");
      json::json!({ "updateAvailable": false })
    })
  }

  pub async fn notifications(&self, user_email: &str) -> json::Value {
    let input = json::json!({ "userEmail": user_email });
    self.query("getNotifications", Some(input)).await.unwrap_or_else(|err| {
      warn!("Fetching notifications failed: {err}");
      json::json!([])
    })
  }
}

#[cfg(test)]
mod tests {
  use mockito::Matcher;

  use super::*;

  #[tokio::test]
  async fn register_unwraps_envelope() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/api.registerUser")
      .match_body(Matcher::PartialJson(json::json!({
        "json": { "email": "ann@example.com", "username": "ann", "planType": "free" }
      })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"result":{"data":{"json":{"id":7}}}}"#)
      .create_async()
      .await;

    let client = Client::new(Some(server.url())).unwrap();
    let result = client
      .register_user(RegisterUser {
        email: "ann@example.com".into(),
        username: None,
        phone: None,
        plan_type: None,
      })
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(result, json::json!({ "id": 7 }));
  }

  #[tokio::test]
  async fn tracking_failures_are_swallowed() {
    let mut server = mockito::Server::new_async().await;
    server.mock("POST", "/api.trackUsage").with_status(503).create_async().await;

    let client = Client::new(Some(server.url())).unwrap();
    let ok = client
      .track_usage(TrackUsage {
        user_email: "ann@example.com".into(),
        action: "optimization_run".into(),
        metadata: json::json!({}),
      })
      .await;

    assert!(!ok);
  }

  #[tokio::test]
  async fn update_check_falls_back() {
    let client = Client::new(None).unwrap();
    let result = client.check_updates("1.0.0").await;
    assert_eq!(result, json::json!({ "updateAvailable": false }));
    assert_eq!(client.feature_flags().await, json::json!([]));
  }
}
