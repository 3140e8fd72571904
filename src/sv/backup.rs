use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    system_backup::{self, BackupType},
    user,
  },
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBackup {
  pub name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub backup_type: BackupType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
  pub success: bool,
  pub backup_id: i32,
  pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restored {
  pub success: bool,
  pub message: String,
  pub restored_state: json::Value,
}

/// Simulated restore points. Nothing on the host is captured or restored.
pub struct Backup<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Backup<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn list(&self, user_id: i32) -> Result<Vec<system_backup::Model>> {
    let backups = system_backup::Entity::find()
      .filter(system_backup::Column::UserId.eq(user_id))
      .order_by_desc(system_backup::Column::CreatedAt)
      .order_by_desc(system_backup::Column::Id)
      .all(self.db)
      .await?;
    Ok(backups)
  }

  pub async fn create(
    &self,
    user: &user::Model,
    input: NewBackup,
  ) -> Result<Created> {
    let len = input.name.chars().count();
    if !(1..=256).contains(&len) {
      return Err(Error::InvalidArgs(
        "Backup name must be between 1 and 256 characters".into(),
      ));
    }

    let now = Utc::now();
    let timestamp = now.timestamp_millis();
    let system_state = json::json!({
      "timestamp": timestamp,
      "userId": user.id,
      "userName": user.name,
      "platform": std::env::consts::OS,
      "arch": std::env::consts::ARCH,
    });
    let diagnostics = json::json!({
      "timestamp": timestamp,
      "note": "Diagnostics snapshot captured at backup creation",
    });
    let metrics = json::json!({
      "timestamp": timestamp,
      "note": "Metrics snapshot captured at backup creation",
    });

    let size_mb = rand::thread_rng().gen_range(50..150);
    let backup = system_backup::ActiveModel {
      user_id: Set(user.id),
      name: Set(input.name.clone()),
      description: Set(input.description),
      system_state: Set(system_state),
      diagnostics_snapshot: Set(Some(diagnostics)),
      metrics_snapshot: Set(Some(metrics)),
      size_mb: Set(size_mb),
      backup_type: Set(input.backup_type),
      status: Set(system_backup::Status::Completed),
      created_at: Set(now.naive_utc()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!("User {} created backup {:?}", user.id, backup.name);
    Ok(Created {
      success: true,
      backup_id: backup.id,
      message: format!("Backup \"{}\" created successfully", input.name),
    })
  }

  async fn owned(&self, user_id: i32, id: i32) -> Result<system_backup::Model> {
    let backup = system_backup::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Backup not found"))?;

    if backup.user_id != user_id {
      return Err(Error::Forbidden("Unauthorized"));
    }
    Ok(backup)
  }

  pub async fn delete(&self, user_id: i32, id: i32) -> Result<()> {
    let backup = self.owned(user_id, id).await?;
    system_backup::Entity::delete_by_id(backup.id).exec(self.db).await?;
    Ok(())
  }

  pub async fn restore(&self, user_id: i32, id: i32) -> Result<Restored> {
    let backup = self.owned(user_id, id).await?;
    info!("Restoring backup {:?} for user {user_id}", backup.name);

    Ok(Restored {
      success: true,
      message: format!("System restored from backup \"{}\"", backup.name),
      restored_state: backup.system_state,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::*;

  fn named(name: &str) -> NewBackup {
    NewBackup {
      name: name.into(),
      description: None,
      backup_type: BackupType::Manual,
    }
  }

  #[tokio::test]
  async fn create_list_restore() {
    let db = setup_test_db().await;
    let user = create_user(&db, "backup-1").await;
    let sv = Backup::new(&db);

    let created = sv.create(&user, named("Before cleanup")).await.unwrap();
    assert_eq!(created.message, "Backup \"Before cleanup\" created successfully");

    let backups = sv.list(user.id).await.unwrap();
    assert_eq!(backups.len(), 1);
    assert!((50..150).contains(&backups[0].size_mb));

    let restored = sv.restore(user.id, created.backup_id).await.unwrap();
    assert_eq!(restored.restored_state["userId"], user.id);
  }

  #[tokio::test]
  async fn create_runs_on_spawned_task() {
    let db = setup_test_db().await;
    let user = create_user(&db, "backup-spawn").await;

    let task = tokio::spawn({
      let db = db.clone();
      async move { Backup::new(&db).create(&user, named("spawned")).await }
    });

    let created = task.await.unwrap().unwrap();
    assert!(created.success);
  }

  #[tokio::test]
  async fn foreign_backups_are_rejected() {
    let db = setup_test_db().await;
    let owner = create_user(&db, "backup-2a").await;
    let other = create_user(&db, "backup-2b").await;
    let sv = Backup::new(&db);

    let created = sv.create(&owner, named("mine")).await.unwrap();

    let err = sv.delete(other.id, created.backup_id).await.unwrap_err();
    assert_eq!(err.to_string(), "Unauthorized");
    let err = sv.restore(owner.id, 9999).await.unwrap_err();
    assert_eq!(err.to_string(), "Backup not found");

    sv.delete(owner.id, created.backup_id).await.unwrap();
    assert!(sv.list(owner.id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn name_length_is_bounded() {
    let db = setup_test_db().await;
    let user = create_user(&db, "backup-3").await;
    let sv = Backup::new(&db);

    assert!(matches!(sv.create(&user, named("")).await, Err(Error::InvalidArgs(_))));
    let long = "x".repeat(257);
    assert!(matches!(sv.create(&user, named(&long)).await, Err(Error::InvalidArgs(_))));
  }
}
