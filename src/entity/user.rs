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
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[sea_orm(string_value = "user")]
  User,
  #[sea_orm(string_value = "admin")]
  Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub open_id: String,
  pub name: Option<String>,
  pub email: Option<String>,
  pub login_method: Option<String>,
  pub role: Role,
  pub phone: Option<String>,
  pub registered_at: Option<DateTime>,
  pub is_registered: bool,
  pub usage_count: i32,
  pub last_used_at: Option<DateTime>,
  pub last_notification_sent_at: Option<DateTime>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
  pub last_signed_in: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "super::subscription::Entity")]
  Subscription,
}

impl Related<super::subscription::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Subscription.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// Best human-readable handle for owner notifications.
  pub fn display_name(&self) -> &str {
    self
      .name
      .as_deref()
      .or(self.email.as_deref())
      .unwrap_or(&self.open_id)
  }
}
