//! License key entity - activation codes with a bounded number of devices

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::subscription::Tier;

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
pub enum LicenseTier {
  #[sea_orm(string_value = "free")]
  Free,
  #[default]
  #[sea_orm(string_value = "pro")]
  Pro,
}

impl From<LicenseTier> for Tier {
  fn from(tier: LicenseTier) -> Self {
    match tier {
      LicenseTier::Free => Tier::Free,
      LicenseTier::Pro => Tier::Pro,
    }
  }
}

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
  #[sea_orm(string_value = "expired")]
  Expired,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Status::Active => "active",
      Status::Revoked => "revoked",
      Status::Expired => "expired",
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "license_keys")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub key: String,
  pub tier: LicenseTier,
  pub max_activations: i32,
  pub current_activations: i32,
  pub status: Status,
  pub expires_at: Option<DateTime>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::license_activation::Entity")]
  Activations,
}

impl Related<super::license_activation::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Activations.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn is_expired(&self, now: DateTime) -> bool {
    self.expires_at.is_some_and(|exp| exp < now)
  }
}
