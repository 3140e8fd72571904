use serde::{Deserialize, Serialize};

use crate::{entity::automatic_settings, prelude::*};

pub const FREQUENCIES: &[&str] = &["daily", "weekly", "monthly"];
pub const PROFILES: &[&str] = &["quick", "balanced", "deep"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  pub schedule_enabled: bool,
  pub schedule_frequency: String,
  pub optimize_on_startup: bool,
  pub low_disk_space_enabled: bool,
  pub disk_space_threshold: i32,
  pub auto_backup: bool,
  pub optimization_profile: String,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      schedule_enabled: false,
      schedule_frequency: "weekly".into(),
      optimize_on_startup: false,
      low_disk_space_enabled: false,
      disk_space_threshold: 10,
      auto_backup: true,
      optimization_profile: "balanced".into(),
    }
  }
}

impl From<automatic_settings::Model> for Settings {
  fn from(model: automatic_settings::Model) -> Self {
    Self {
      schedule_enabled: model.schedule_enabled,
      schedule_frequency: model.schedule_frequency,
      optimize_on_startup: model.optimize_on_startup,
      low_disk_space_enabled: model.low_disk_space_enabled,
      disk_space_threshold: model.disk_space_threshold,
      auto_backup: model.auto_backup,
      optimization_profile: model.optimization_profile,
    }
  }
}

impl Settings {
  pub fn validate(&self) -> Result<()> {
    if !FREQUENCIES.contains(&self.schedule_frequency.as_str()) {
      return Err(Error::InvalidArgs(format!(
        "Invalid schedule frequency: {}",
        self.schedule_frequency
      )));
    }
    if !(5..=30).contains(&self.disk_space_threshold) {
      return Err(Error::InvalidArgs(
        "Disk space threshold must be between 5 and 30".into(),
      ));
    }
    if !PROFILES.contains(&self.optimization_profile.as_str()) {
      return Err(Error::InvalidArgs(format!(
        "Invalid optimization profile: {}",
        self.optimization_profile
      )));
    }
    Ok(())
  }
}

/// Per-user automatic maintenance preferences.
pub struct Automatic<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Automatic<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn find(&self, user_id: i32) -> Result<Option<automatic_settings::Model>> {
    let settings = automatic_settings::Entity::find()
      .filter(automatic_settings::Column::UserId.eq(user_id))
      .one(self.db)
      .await?;
    Ok(settings)
  }

  pub async fn settings(&self, user_id: i32) -> Result<Settings> {
    Ok(self.find(user_id).await?.map(Settings::from).unwrap_or_default())
  }

  /// Validates and upserts; the caller reschedules jobs afterwards.
  pub async fn save(&self, user_id: i32, input: Settings) -> Result<Settings> {
    input.validate()?;

    let now = Utc::now().naive_utc();
    let mut active: automatic_settings::ActiveModel =
      match self.find(user_id).await? {
        Some(existing) => existing.into(),
        None => automatic_settings::ActiveModel {
          user_id: Set(user_id),
          created_at: Set(now),
          ..Default::default()
        },
      };

    active.schedule_enabled = Set(input.schedule_enabled);
    active.schedule_frequency = Set(input.schedule_frequency.clone());
    active.optimize_on_startup = Set(input.optimize_on_startup);
    active.low_disk_space_enabled = Set(input.low_disk_space_enabled);
    active.disk_space_threshold = Set(input.disk_space_threshold);
    active.auto_backup = Set(input.auto_backup);
    active.optimization_profile = Set(input.optimization_profile.clone());
    active.updated_at = Set(now);
    active.save(self.db).await?;

    Ok(input)
  }

  /// Rows with scheduling turned on, used to rebuild jobs at boot.
  pub async fn scheduled(&self) -> Result<Vec<automatic_settings::Model>> {
    let rows = automatic_settings::Entity::find()
      .filter(automatic_settings::Column::ScheduleEnabled.eq(true))
      .all(self.db)
      .await?;
    Ok(rows)
  }
}
