//! Back-office operations: feature flags, releases, bulk keys, users, and
//! app settings. Callers must check the admin role first.

use sea_orm::TryIntoModel;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    LicenseTier, Role, SubscriptionStatus, Tier, app_settings,
    app_update::{self, ReleaseType},
    feature_flag, license_key, subscription, user,
  },
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlag {
  pub flag_key: String,
  pub flag_name: String,
  pub description: Option<String>,
  pub enabled: bool,
  pub requires_pro: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagPatch {
  pub id: i32,
  pub flag_name: Option<String>,
  pub description: Option<String>,
  pub enabled: Option<bool>,
  pub requires_pro: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelease {
  pub version: String,
  pub changelog: String,
  pub download_url: String,
  #[serde(default)]
  pub release_type: ReleaseType,
  #[serde(default)]
  pub mandatory: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePatch {
  pub id: i32,
  pub changelog: Option<String>,
  pub download_url: Option<String>,
  pub release_type: Option<ReleaseType>,
  pub mandatory: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBatch {
  pub count: u32,
  pub tier: LicenseTier,
  #[serde(default = "one")]
  pub max_activations: i32,
  pub expires_in_days: Option<i64>,
}

fn one() -> i32 {
  1
}

#[derive(Debug, Clone, Serialize)]
pub struct Generated {
  pub generated: usize,
  pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
  #[serde(flatten)]
  pub user: user::Model,
  pub subscription: Option<subscription::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total_users: u64,
  pub free_users: u64,
  pub pro_users: u64,
  pub active_subscriptions: u64,
  pub revenue: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
  pub pro_plan_enabled: bool,
  pub monthly_price: i32,
  pub yearly_price: i32,
  pub trial_days: i32,
  pub paypal_enabled: bool,
  pub paypal_client_id: Option<String>,
  pub paypal_client_secret: Option<String>,
  pub paypal_mode: String,
  pub stripe_enabled: bool,
  pub stripe_public_key: Option<String>,
  pub stripe_secret_key: Option<String>,
  pub intuit_enabled: bool,
  pub intuit_client_id: Option<String>,
  pub intuit_client_secret: Option<String>,
}

const PRO_MONTHLY_PRICE: f64 = 29.99;
const MAX_EXPIRY_DAYS: i64 = 36_500;
const MAX_TRIAL_DAYS: i32 = 365;

fn validate_url(url: &str) -> Result<()> {
  if url.starts_with("http://") || url.starts_with("https://") {
    Ok(())
  } else {
    Err(Error::InvalidArgs("downloadUrl must be a valid URL".into()))
  }
}

fn default_settings(now: DateTime) -> app_settings::Model {
  app_settings::Model {
    id: 0,
    pro_plan_enabled: false,
    monthly_price: 999,
    yearly_price: 9999,
    trial_days: 5,
    paypal_enabled: false,
    stripe_enabled: false,
    intuit_enabled: false,
    paypal_client_id: None,
    paypal_client_secret: None,
    paypal_mode: "sandbox".into(),
    stripe_public_key: None,
    stripe_secret_key: None,
    intuit_client_id: None,
    intuit_client_secret: None,
    created_at: now,
    updated_at: now,
  }
}

pub struct Admin<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Admin<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn flags(&self) -> Result<Vec<feature_flag::Model>> {
    let flags = feature_flag::Entity::find()
      .order_by_asc(feature_flag::Column::FlagKey)
      .all(self.db)
      .await?;
    Ok(flags)
  }

  pub async fn create_flag(&self, input: NewFlag) -> Result<feature_flag::Model> {
    if input.flag_key.is_empty() || input.flag_name.is_empty() {
      return Err(Error::InvalidArgs("flagKey and flagName are required".into()));
    }

    let now = Utc::now().naive_utc();
    let flag = feature_flag::ActiveModel {
      flag_key: Set(input.flag_key),
      flag_name: Set(input.flag_name),
      description: Set(input.description),
      enabled: Set(input.enabled),
      requires_pro: Set(input.requires_pro),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!("Created feature flag {}", flag.flag_key);
    Ok(flag)
  }

  pub async fn update_flag(&self, patch: FlagPatch) -> Result<feature_flag::Model> {
    let flag = feature_flag::Entity::find_by_id(patch.id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Feature flag not found"))?;

    let mut active: feature_flag::ActiveModel = flag.into();
    if let Some(name) = patch.flag_name {
      active.flag_name = Set(name);
    }
    if let Some(description) = patch.description {
      active.description = Set(Some(description));
    }
    if let Some(enabled) = patch.enabled {
      active.enabled = Set(enabled);
    }
    if let Some(requires_pro) = patch.requires_pro {
      active.requires_pro = Set(requires_pro);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(active.update(self.db).await?)
  }

  pub async fn delete_flag(&self, id: i32) -> Result<()> {
    feature_flag::Entity::delete_by_id(id).exec(self.db).await?;
    Ok(())
  }

  pub async fn releases(&self) -> Result<Vec<app_update::Model>> {
    let releases = app_update::Entity::find()
      .order_by_desc(app_update::Column::ReleasedAt)
      .all(self.db)
      .await?;
    Ok(releases)
  }

  pub async fn create_release(&self, input: NewRelease) -> Result<app_update::Model> {
    if input.version.is_empty() || input.changelog.is_empty() {
      return Err(Error::InvalidArgs("version and changelog are required".into()));
    }
    validate_url(&input.download_url)?;

    let now = Utc::now().naive_utc();
    let release = app_update::ActiveModel {
      version: Set(input.version),
      changelog: Set(input.changelog),
      download_url: Set(input.download_url),
      release_type: Set(input.release_type),
      mandatory: Set(input.mandatory),
      released_at: Set(now),
      created_at: Set(now),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!("Published {:?} release {}", release.release_type, release.version);
    Ok(release)
  }

  pub async fn update_release(
    &self,
    patch: ReleasePatch,
  ) -> Result<app_update::Model> {
    let release = app_update::Entity::find_by_id(patch.id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Update not found"))?;

    let mut active: app_update::ActiveModel = release.into();
    if let Some(changelog) = patch.changelog {
      active.changelog = Set(changelog);
    }
    if let Some(url) = patch.download_url {
      validate_url(&url)?;
      active.download_url = Set(url);
    }
    if let Some(release_type) = patch.release_type {
      active.release_type = Set(release_type);
    }
    if let Some(mandatory) = patch.mandatory {
      active.mandatory = Set(mandatory);
    }

    Ok(active.update(self.db).await?)
  }

  pub async fn delete_release(&self, id: i32) -> Result<()> {
    app_update::Entity::delete_by_id(id).exec(self.db).await?;
    Ok(())
  }

  pub async fn latest_release(
    &self,
    release_type: Option<ReleaseType>,
  ) -> Result<Option<app_update::Model>> {
    let mut query = app_update::Entity::find();
    if let Some(release_type) = release_type {
      query = query.filter(app_update::Column::ReleaseType.eq(release_type));
    }

    let latest = query
      .order_by_desc(app_update::Column::ReleasedAt)
      .order_by_desc(app_update::Column::Id)
      .one(self.db)
      .await?;
    Ok(latest)
  }

  pub async fn licenses(
    &self,
    status: Option<license_key::Status>,
    limit: u64,
  ) -> Result<Vec<license_key::Model>> {
    if !(1..=100).contains(&limit) {
      return Err(Error::InvalidArgs("limit must be between 1 and 100".into()));
    }

    let mut query = license_key::Entity::find();
    if let Some(status) = status {
      query = query.filter(license_key::Column::Status.eq(status));
    }

    let licenses = query
      .order_by_desc(license_key::Column::CreatedAt)
      .limit(limit)
      .all(self.db)
      .await?;
    Ok(licenses)
  }

  pub async fn generate_keys(&self, batch: KeyBatch) -> Result<Generated> {
    if !(1..=100).contains(&batch.count) {
      return Err(Error::InvalidArgs("count must be between 1 and 100".into()));
    }
    if batch.max_activations < 1 {
      return Err(Error::InvalidArgs("maxActivations must be at least 1".into()));
    }
    if batch
      .expires_in_days
      .is_some_and(|days| !(1..=MAX_EXPIRY_DAYS).contains(&days))
    {
      return Err(Error::InvalidArgs(format!(
        "expiresInDays must be between 1 and {MAX_EXPIRY_DAYS}"
      )));
    }

    let now = Utc::now().naive_utc();
    let expires_at = match batch.expires_in_days {
      Some(days) => Some(utils::days_after(now, days).ok_or_else(|| {
        Error::InvalidArgs("expiresInDays is out of range".into())
      })?),
      None => None,
    };
    let keys: Vec<String> =
      (0..batch.count).map(|_| utils::subscription_key()).collect();

    let rows = keys.iter().map(|key| license_key::ActiveModel {
      key: Set(key.clone()),
      tier: Set(batch.tier),
      max_activations: Set(batch.max_activations),
      current_activations: Set(0),
      status: Set(license_key::Status::Active),
      expires_at: Set(expires_at),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    });
    license_key::Entity::insert_many(rows).exec(self.db).await?;

    info!("Generated {} {:?} subscription keys", keys.len(), batch.tier);
    Ok(Generated { generated: keys.len(), keys })
  }

  pub async fn revoke_key(&self, id: i32) -> Result<()> {
    let res = license_key::Entity::update_many()
      .col_expr(
        license_key::Column::Status,
        Expr::value(license_key::Status::Revoked.as_str()),
      )
      .col_expr(
        license_key::Column::UpdatedAt,
        Expr::value(Utc::now().naive_utc()),
      )
      .filter(license_key::Column::Id.eq(id))
      .exec(self.db)
      .await?;

    if res.rows_affected == 0 {
      return Err(Error::NotFound("License not found"));
    }
    Ok(())
  }

  pub async fn users(&self, limit: u64, offset: u64) -> Result<Vec<UserRow>> {
    if !(1..=100).contains(&limit) {
      return Err(Error::InvalidArgs("limit must be between 1 and 100".into()));
    }

    let rows = user::Entity::find()
      .find_also_related(subscription::Entity)
      .order_by_desc(user::Column::CreatedAt)
      .limit(limit)
      .offset(offset)
      .all(self.db)
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(user, subscription)| UserRow { user, subscription })
        .collect(),
    )
  }

  pub async fn update_role(&self, user_id: i32, role: Role) -> Result<()> {
    super::User::new(self.db).set_role(user_id, role).await?;
    Ok(())
  }

  pub async fn stats(&self) -> Result<Stats> {
    let subs = subscription::Entity::find;

    let total_users = super::User::new(self.db).count().await?;
    let free_users =
      subs().filter(subscription::Column::Tier.eq(Tier::Free)).count(self.db).await?;
    let pro_users =
      subs().filter(subscription::Column::Tier.eq(Tier::Pro)).count(self.db).await?;
    let active_subscriptions = subs()
      .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
      .count(self.db)
      .await?;

    Ok(Stats {
      total_users,
      free_users,
      pro_users,
      active_subscriptions,
      revenue: pro_users as f64 * PRO_MONTHLY_PRICE,
    })
  }

  pub async fn settings(&self) -> Result<app_settings::Model> {
    let settings = app_settings::Entity::find().one(self.db).await?;
    Ok(settings.unwrap_or_else(|| default_settings(Utc::now().naive_utc())))
  }

  pub async fn update_settings(
    &self,
    input: SettingsInput,
  ) -> Result<app_settings::Model> {
    if input.monthly_price < 0 || input.yearly_price < 0 || input.trial_days < 0
    {
      return Err(Error::InvalidArgs(
        "Prices and trial days must not be negative".into(),
      ));
    }
    if input.trial_days > MAX_TRIAL_DAYS {
      return Err(Error::InvalidArgs(format!(
        "trialDays must not exceed {MAX_TRIAL_DAYS}"
      )));
    }
    if !matches!(input.paypal_mode.as_str(), "sandbox" | "live") {
      return Err(Error::InvalidArgs("paypalMode must be sandbox or live".into()));
    }

    let now = Utc::now().naive_utc();
    let mut active: app_settings::ActiveModel =
      match app_settings::Entity::find().one(self.db).await? {
        Some(existing) => existing.into(),
        None => app_settings::ActiveModel {
          created_at: Set(now),
          ..Default::default()
        },
      };

    active.pro_plan_enabled = Set(input.pro_plan_enabled);
    active.monthly_price = Set(input.monthly_price);
    active.yearly_price = Set(input.yearly_price);
    active.trial_days = Set(input.trial_days);
    active.paypal_enabled = Set(input.paypal_enabled);
    active.paypal_client_id = Set(input.paypal_client_id);
    active.paypal_client_secret = Set(input.paypal_client_secret);
    active.paypal_mode = Set(input.paypal_mode);
    active.stripe_enabled = Set(input.stripe_enabled);
    active.stripe_public_key = Set(input.stripe_public_key);
    active.stripe_secret_key = Set(input.stripe_secret_key);
    active.intuit_enabled = Set(input.intuit_enabled);
    active.intuit_client_id = Set(input.intuit_client_id);
    active.intuit_client_secret = Set(input.intuit_client_secret);
    active.updated_at = Set(now);

    let saved = active.save(self.db).await?;
    info!("App settings updated");
    Ok(saved.try_into_model()?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{self, testing::*};

  fn settings_input(trial_days: i32) -> SettingsInput {
    SettingsInput {
      pro_plan_enabled: true,
      monthly_price: 2999,
      yearly_price: 14999,
      trial_days,
      paypal_enabled: false,
      paypal_client_id: None,
      paypal_client_secret: None,
      paypal_mode: "sandbox".into(),
      stripe_enabled: true,
      stripe_public_key: Some("pk_test".into()),
      stripe_secret_key: Some("sk_test".into()),
      intuit_enabled: false,
      intuit_client_id: None,
      intuit_client_secret: None,
    }
  }

  #[tokio::test]
  async fn flag_lifecycle() {
    let db = setup_test_db().await;
    let admin = Admin::new(&db);

    let flag = admin
      .create_flag(NewFlag {
        flag_key: "ai-chat".into(),
        flag_name: "AI chat".into(),
        description: None,
        enabled: false,
        requires_pro: true,
      })
      .await
      .unwrap();

    let updated = admin
      .update_flag(FlagPatch { id: flag.id, enabled: Some(true), ..Default::default() })
      .await
      .unwrap();
    assert!(updated.enabled);
    assert!(updated.requires_pro);

    admin.delete_flag(flag.id).await.unwrap();
    assert!(admin.flags().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn latest_release_by_channel() {
    let db = setup_test_db().await;
    let admin = Admin::new(&db);

    for (version, release_type) in
      [("1.1.0", ReleaseType::Stable), ("1.2.0-beta", ReleaseType::Beta)]
    {
      admin
        .create_release(NewRelease {
          version: version.into(),
          changelog: "Fixes".into(),
          download_url: "https://example.com/fixmate.exe".into(),
          release_type,
          mandatory: false,
        })
        .await
        .unwrap();
    }

    let stable = admin.latest_release(Some(ReleaseType::Stable)).await.unwrap();
    assert_eq!(stable.unwrap().version, "1.1.0");
    let any = admin.latest_release(None).await.unwrap();
    assert_eq!(any.unwrap().version, "1.2.0-beta");

    let bad = admin
      .create_release(NewRelease {
        version: "2.0.0".into(),
        changelog: "x".into(),
        download_url: "ftp://nope".into(),
        release_type: ReleaseType::Alpha,
        mandatory: true,
      })
      .await;
    assert!(matches!(bad, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn generated_keys_activate_subscriptions() {
    let db = setup_test_db().await;
    let user = create_user(&db, "admin-1").await;
    let admin = Admin::new(&db);

    let batch = admin
      .generate_keys(KeyBatch {
        count: 3,
        tier: LicenseTier::Pro,
        max_activations: 1,
        expires_in_days: Some(30),
      })
      .await
      .unwrap();
    assert_eq!(batch.generated, 3);
    assert!(batch.keys.iter().all(|k| k.starts_with("FM-") && k.len() == 19));

    sv::Subscription::new(&db).activate(user.id, &batch.keys[0]).await.unwrap();

    let stats = admin.stats().await.unwrap();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.pro_users, 1);
    assert_eq!(stats.revenue, PRO_MONTHLY_PRICE);

    let key = admin.licenses(None, 100).await.unwrap()[0].clone();
    admin.revoke_key(key.id).await.unwrap();
    let revoked = admin
      .licenses(Some(license_key::Status::Revoked), 10)
      .await
      .unwrap();
    assert_eq!(revoked.len(), 1);

    assert!(matches!(
      admin
        .generate_keys(KeyBatch {
          count: 101,
          tier: LicenseTier::Free,
          max_activations: 1,
          expires_in_days: None,
        })
        .await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn expiry_days_are_bounded() {
    let db = setup_test_db().await;
    let admin = Admin::new(&db);
    let batch = |days| KeyBatch {
      count: 1,
      tier: LicenseTier::Pro,
      max_activations: 1,
      expires_in_days: Some(days),
    };

    for days in [0, MAX_EXPIRY_DAYS + 1, 100_000_000, i64::MAX] {
      assert!(matches!(
        admin.generate_keys(batch(days)).await,
        Err(Error::InvalidArgs(_))
      ));
    }

    let generated = admin.generate_keys(batch(MAX_EXPIRY_DAYS)).await.unwrap();
    assert_eq!(generated.generated, 1);
    let stored = admin.licenses(None, 10).await.unwrap();
    assert!(stored[0].expires_at.is_some());

    assert!(matches!(
      admin.update_settings(settings_input(MAX_TRIAL_DAYS + 1)).await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn users_list_includes_subscription() {
    let db = setup_test_db().await;
    let user = create_user(&db, "admin-2").await;
    let admin = Admin::new(&db);

    let rows = admin.users(50, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].subscription.is_none());

    sv::Subscription::new(&db).start_trial(user.id).await.unwrap();
    admin.update_role(user.id, Role::Admin).await.unwrap();

    let rows = admin.users(50, 0).await.unwrap();
    assert_eq!(rows[0].user.role, Role::Admin);
    assert_eq!(rows[0].subscription.as_ref().unwrap().tier, Tier::Trial);
  }

  #[tokio::test]
  async fn settings_default_then_persist() {
    let db = setup_test_db().await;
    let admin = Admin::new(&db);

    let defaults = admin.settings().await.unwrap();
    assert_eq!(defaults.trial_days, 5);
    assert_eq!(defaults.paypal_mode, "sandbox");

    admin.update_settings(settings_input(7)).await.unwrap();
    let stored = admin.settings().await.unwrap();
    assert_eq!(stored.trial_days, 7);
    assert_eq!(stored.stripe_secret_key.as_deref(), Some("sk_test"));

    // subscription trials follow the admin setting
    let user = create_user(&db, "admin-3").await;
    let started = sv::Subscription::new(&db).start_trial(user.id).await.unwrap();
    assert!(started.message.starts_with("Your 7-day free trial"));
  }
}
