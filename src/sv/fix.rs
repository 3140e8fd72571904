//! Simulated repairs. Everything except the performance fix is premium-only.

use json::{Value, json};
use serde::Serialize;

use crate::{prelude::*, sv};

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
  pub success: bool,
  pub message: String,
  pub details: Value,
}

impl Outcome {
  fn done(message: impl Into<String>, details: Value) -> Self {
    Self { success: true, message: message.into(), details }
  }
}

pub struct Fix<'a> {
  db: &'a DatabaseConnection,
  delay: Duration,
}

impl<'a> Fix<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db, delay: Duration::ZERO }
  }

  /// Simulated work time; `weight` scales it per fix kind.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  async fn work(&self, weight: u32) {
    if !self.delay.is_zero() {
      time::sleep(self.delay * weight / 3).await;
    }
  }

  async fn gate(&self, user_id: i32, message: &str) -> Result<()> {
    sv::Subscription::new(self.db).require_premium(user_id, message).await
  }

  pub async fn performance_issue(&self, issue: &str) -> Result<Outcome> {
    self.work(3).await;
    Ok(Outcome::done(
      format!("Fixed: {issue}"),
      json!({
        "issue": issue,
        "spaceFreed": "4.2GB",
        "performanceImprovement": "25%",
      }),
    ))
  }

  pub async fn windows_updates(&self, user_id: i32) -> Result<Outcome> {
    self
      .gate(user_id, "Windows Update fix requires a Pro subscription or active trial")
      .await?;
    self.work(4).await;
    Ok(Outcome::done(
      "Windows Update installation initiated. 3 updates will be installed.",
      json!({
        "updatesInstalled": 3,
        "rebootRequired": true,
        "estimatedTime": "15-20 minutes",
      }),
    ))
  }

  pub async fn startup_programs(
    &self,
    user_id: i32,
    program_ids: &[String],
  ) -> Result<Outcome> {
    self
      .gate(user_id, "Startup optimization requires a Pro subscription or active trial")
      .await?;
    self.work(3).await;
    Ok(Outcome::done(
      format!("{} startup programs optimized", program_ids.len()),
      json!({
        "programsDisabled": program_ids.len(),
        "expectedSpeedImprovement": "30-40% faster boot time",
      }),
    ))
  }

  pub async fn drivers(
    &self,
    user_id: i32,
    driver_ids: &[String],
  ) -> Result<Outcome> {
    self
      .gate(user_id, "Driver updates require a Pro subscription or active trial")
      .await?;
    self.work(6).await;
    Ok(Outcome::done(
      format!("{} drivers updated successfully", driver_ids.len()),
      json!({ "driversUpdated": driver_ids.len(), "rebootRequired": true }),
    ))
  }

  pub async fn security(&self, user_id: i32) -> Result<Outcome> {
    self
      .gate(user_id, "Security fixes require a Pro subscription or active trial")
      .await?;
    self.work(3).await;
    Ok(Outcome::done(
      "Security configuration fixed",
      json!({
        "firewallEnabled": true,
        "antivirusEnabled": true,
        "definitionsUpdated": true,
      }),
    ))
  }

  pub async fn all(&self, user_id: i32) -> Result<Outcome> {
    self
      .gate(user_id, "Fix All requires a Pro subscription or active trial")
      .await?;
    self.work(10).await;
    Ok(Outcome::done(
      "All issues fixed successfully!",
      json!({
        "windowsUpdatesInstalled": 3,
        "startupProgramsOptimized": 8,
        "driversUpdated": 2,
        "securityFixed": true,
        "rebootRequired": true,
        "estimatedImprovements": {
          "bootTime": "40% faster",
          "performance": "35% improvement",
          "security": "100% protected",
        },
      }),
    ))
  }

  pub fn history(&self) -> Value {
    let now = Utc::now();
    json!({
      "fixes": [
        {
          "id": 1,
          "type": "windows_update",
          "timestamp": (now - TimeDelta::days(1)).to_rfc3339(),
          "status": "completed",
          "details": "3 updates installed",
        },
        {
          "id": 2,
          "type": "startup_optimization",
          "timestamp": (now - TimeDelta::days(2)).to_rfc3339(),
          "status": "completed",
          "details": "5 programs disabled",
        },
      ]
    })
  }
}
