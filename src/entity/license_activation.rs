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
#[serde(rename_all = "lowercase")]
pub enum Status {
  #[default]
  #[sea_orm(string_value = "active")]
  Active,
  #[sea_orm(string_value = "revoked")]
  Revoked,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "license_activations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub license_key_id: i32,
  pub device_id: String,
  pub user_email: Option<String>,
  pub user_name: Option<String>,
  pub installation_date: DateTime,
  pub last_seen_at: DateTime,
  pub status: Status,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::license_key::Entity",
    from = "Column::LicenseKeyId",
    to = "super::license_key::Column::Id"
  )]
  LicenseKey,
}

impl Related<super::license_key::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::LicenseKey.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
