use serde::Serialize;

use crate::{
  diagnostics,
  entity::system_scan::{self, ScanType, Status},
  prelude::*,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
  pub scan_id: i32,
  pub status: Status,
  pub issues_found: i32,
}

pub struct Scan<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Scan<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Records a scan as running, then completes it with canned results.
  pub async fn run(&self, user_id: i32, scan_type: ScanType) -> Result<Outcome> {
    let scan = system_scan::ActiveModel {
      user_id: Set(user_id),
      scan_type: Set(scan_type),
      results: Set(json::json!({})),
      issues_found: Set(0),
      status: Set(Status::Running),
      created_at: Set(Utc::now().naive_utc()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    let scan = system_scan::ActiveModel {
      results: Set(diagnostics::scan_results()),
      issues_found: Set(diagnostics::SCAN_ISSUES),
      status: Set(Status::Completed),
      ..scan.into()
    }
    .update(self.db)
    .await?;

    info!("Scan {} ({scan_type:?}) completed for user {user_id}", scan.id);
    Ok(Outcome {
      scan_id: scan.id,
      status: scan.status,
      issues_found: scan.issues_found,
    })
  }

  pub async fn history(&self, user_id: i32) -> Result<Vec<system_scan::Model>> {
    let scans = system_scan::Entity::find()
      .filter(system_scan::Column::UserId.eq(user_id))
      .order_by_desc(system_scan::Column::CreatedAt)
      .order_by_desc(system_scan::Column::Id)
      .limit(10)
      .all(self.db)
      .await?;
    Ok(scans)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::*;

  #[tokio::test]
  async fn scans_complete_and_history_is_capped() {
    let db = setup_test_db().await;
    let user = create_user(&db, "scan-1").await;
    let sv = Scan::new(&db);

    let outcome = sv.run(user.id, ScanType::Quick).await.unwrap();
    assert_eq!(outcome.status, Status::Completed);
    assert_eq!(outcome.issues_found, 5);

    for _ in 0..11 {
      sv.run(user.id, ScanType::Full).await.unwrap();
    }
    let history = sv.history(user.id).await.unwrap();
    assert_eq!(history.len(), 10);
    assert!(history.iter().all(|s| s.status == Status::Completed));
  }
}
