use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SnapshotType {
  #[sea_orm(string_value = "before_fix")]
  BeforeFix,
  #[sea_orm(string_value = "after_fix")]
  AfterFix,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "performance_snapshots")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i32,
  pub snapshot_type: SnapshotType,
  pub fix_type: Option<String>,
  pub boot_time_seconds: Option<i32>,
  pub cpu_usage_percent: Option<i32>,
  pub memory_usage_percent: Option<i32>,
  pub disk_usage_percent: Option<i32>,
  pub startup_programs_count: Option<i32>,
  pub outdated_drivers_count: Option<i32>,
  pub security_issues_count: Option<i32>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::Id"
  )]
  User,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
