//! Per-user entitlement row driving the free/trial/pro state machine

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
pub enum Tier {
  #[default]
  #[sea_orm(string_value = "free")]
  Free,
  #[sea_orm(string_value = "trial")]
  Trial,
  #[sea_orm(string_value = "pro")]
  Pro,
}

impl Tier {
  pub fn is_premium(self) -> bool {
    matches!(self, Tier::Pro | Tier::Trial)
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
pub enum Plan {
  #[default]
  #[sea_orm(string_value = "none")]
  None,
  #[sea_orm(string_value = "monthly")]
  Monthly,
  #[sea_orm(string_value = "quarterly")]
  Quarterly,
  #[sea_orm(string_value = "biannual")]
  Biannual,
  #[sea_orm(string_value = "annual")]
  Annual,
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
  #[sea_orm(string_value = "trial")]
  Trial,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
  #[sea_orm(string_value = "expired")]
  Expired,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub user_id: i32,
  pub tier: Tier,
  pub plan: Plan,
  pub status: Status,
  pub license_key: Option<String>,
  pub trial_started_at: Option<DateTime>,
  pub trial_ends_at: Option<DateTime>,
  pub has_used_trial: bool,
  pub expires_at: Option<DateTime>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
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
