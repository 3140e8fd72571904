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
pub enum ReleaseType {
  #[default]
  #[sea_orm(string_value = "stable")]
  Stable,
  #[sea_orm(string_value = "beta")]
  Beta,
  #[sea_orm(string_value = "alpha")]
  Alpha,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_updates")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub version: String,
  pub changelog: String,
  pub download_url: String,
  pub release_type: ReleaseType,
  pub mandatory: bool,
  pub released_at: DateTime,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
