use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
pub enum BackupType {
  #[default]
  #[sea_orm(string_value = "manual")]
  Manual,
  #[sea_orm(string_value = "automatic")]
  Automatic,
  #[sea_orm(string_value = "pre-optimization")]
  PreOptimization,
}

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
#[serde(rename_all = "lowercase")]
pub enum Status {
  #[sea_orm(string_value = "creating")]
  Creating,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "failed")]
  Failed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_backups")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i32,
  pub name: String,
  pub description: Option<String>,
  pub system_state: Json,
  pub diagnostics_snapshot: Option<Json>,
  pub metrics_snapshot: Option<Json>,
  pub size_mb: i32,
  pub backup_type: BackupType,
  pub status: Status,
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
