use serde::{Deserialize, Serialize};

use crate::{
  entity::performance_snapshot::{self, SnapshotType},
  prelude::*,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
  pub boot_time_seconds: Option<i32>,
  pub cpu_usage_percent: Option<i32>,
  pub memory_usage_percent: Option<i32>,
  pub disk_usage_percent: Option<i32>,
  pub startup_programs_count: Option<i32>,
  pub outdated_drivers_count: Option<i32>,
  pub security_issues_count: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delta {
  pub before: Option<i32>,
  pub after: Option<i32>,
  pub improvement: Option<i64>,
}

impl Delta {
  fn new(before: Option<i32>, after: Option<i32>) -> Self {
    Self { before, after, improvement: utils::improvement(before, after) }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvements {
  pub boot_time: Delta,
  pub cpu_usage: Delta,
  pub memory_usage: Delta,
  pub disk_usage: Delta,
  pub startup_programs: Delta,
  pub outdated_drivers: Delta,
  pub security_issues: Delta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
  pub has_data: bool,
  pub improvements: Option<Improvements>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub before_snapshot: Option<performance_snapshot::Model>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub after_snapshot: Option<performance_snapshot::Model>,
}

impl Comparison {
  fn empty() -> Self {
    Self {
      has_data: false,
      improvements: None,
      before_snapshot: None,
      after_snapshot: None,
    }
  }

  fn between(
    before: performance_snapshot::Model,
    after: performance_snapshot::Model,
  ) -> Self {
    let improvements = Improvements {
      boot_time: Delta::new(before.boot_time_seconds, after.boot_time_seconds),
      cpu_usage: Delta::new(before.cpu_usage_percent, after.cpu_usage_percent),
      memory_usage: Delta::new(
        before.memory_usage_percent,
        after.memory_usage_percent,
      ),
      disk_usage: Delta::new(
        before.disk_usage_percent,
        after.disk_usage_percent,
      ),
      startup_programs: Delta::new(
        before.startup_programs_count,
        after.startup_programs_count,
      ),
      outdated_drivers: Delta::new(
        before.outdated_drivers_count,
        after.outdated_drivers_count,
      ),
      security_issues: Delta::new(
        before.security_issues_count,
        after.security_issues_count,
      ),
    };

    Self {
      has_data: true,
      improvements: Some(improvements),
      before_snapshot: Some(before),
      after_snapshot: Some(after),
    }
  }
}

/// Before/after performance snapshots around fixes.
pub struct Metrics<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Metrics<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn capture(
    &self,
    user_id: i32,
    snapshot_type: SnapshotType,
    fix_type: &str,
    sample: Sample,
  ) -> Result<performance_snapshot::Model> {
    let snapshot = performance_snapshot::ActiveModel {
      user_id: Set(user_id),
      snapshot_type: Set(snapshot_type),
      fix_type: Set(Some(fix_type.to_string())),
      boot_time_seconds: Set(sample.boot_time_seconds),
      cpu_usage_percent: Set(sample.cpu_usage_percent),
      memory_usage_percent: Set(sample.memory_usage_percent),
      disk_usage_percent: Set(sample.disk_usage_percent),
      startup_programs_count: Set(sample.startup_programs_count),
      outdated_drivers_count: Set(sample.outdated_drivers_count),
      security_issues_count: Set(sample.security_issues_count),
      created_at: Set(Utc::now().naive_utc()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    debug!("Captured {snapshot_type:?} snapshot for user {user_id} ({fix_type})");
    Ok(snapshot)
  }

  fn latest(&self, user_id: i32) -> sea_orm::Select<performance_snapshot::Entity> {
    performance_snapshot::Entity::find()
      .filter(performance_snapshot::Column::UserId.eq(user_id))
      .order_by_desc(performance_snapshot::Column::CreatedAt)
      .order_by_desc(performance_snapshot::Column::Id)
  }

  /// Compares the newest before/after pair among the last 20 snapshots.
  pub async fn comparison(
    &self,
    user_id: i32,
    fix_type: Option<&str>,
  ) -> Result<Comparison> {
    let mut query = self.latest(user_id);
    if let Some(fix_type) = fix_type {
      query = query.filter(performance_snapshot::Column::FixType.eq(fix_type));
    }
    let snapshots = query.limit(20).all(self.db).await?;

    let find = |ty| snapshots.iter().find(|s| s.snapshot_type == ty).cloned();
    match (find(SnapshotType::BeforeFix), find(SnapshotType::AfterFix)) {
      (Some(before), Some(after)) => Ok(Comparison::between(before, after)),
      _ => Ok(Comparison::empty()),
    }
  }

  pub async fn history(
    &self,
    user_id: i32,
  ) -> Result<Vec<performance_snapshot::Model>> {
    Ok(self.latest(user_id).limit(50).all(self.db).await?)
  }
}
