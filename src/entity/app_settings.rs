//! Singleton row with pricing and payment provider configuration

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_settings")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub pro_plan_enabled: bool,
  /// Prices are stored in cents.
  pub monthly_price: i32,
  pub yearly_price: i32,
  pub trial_days: i32,
  pub paypal_enabled: bool,
  pub stripe_enabled: bool,
  pub intuit_enabled: bool,
  pub paypal_client_id: Option<String>,
  #[serde(skip_serializing)]
  pub paypal_client_secret: Option<String>,
  pub paypal_mode: String,
  pub stripe_public_key: Option<String>,
  #[serde(skip_serializing)]
  pub stripe_secret_key: Option<String>,
  pub intuit_client_id: Option<String>,
  #[serde(skip_serializing)]
  pub intuit_client_secret: Option<String>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
