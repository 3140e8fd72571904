//! Free/trial/pro entitlement state machine.
//!
//! `free --start_trial--> trial --(trial_ends_at passes, observed on read)--> free/expired`
//! and `any --activate(key)--> pro|free/active`. Expiry is lazy: nothing
//! sweeps the table, the transition happens when the row is next read.

use sea_orm::DatabaseTransaction;
use serde::Serialize;

use crate::{
  entity::{
    Plan, SubscriptionStatus, Tier, app_settings, license_key, subscription,
  },
  prelude::*,
};

pub const DEFAULT_TRIAL_DAYS: i64 = 5;
const MIN_KEY_LEN: usize = 10;

pub const PREMIUM_FEATURES: &[&str] = &[
  "driver-updates",
  "pc-optimization",
  "speed-boost",
  "advanced-diagnostics",
  "priority-support",
  "auto-fix",
];

#[derive(Debug, Clone, Serialize)]
pub struct PricingTier {
  pub name: &'static str,
  pub price: f64,
  pub period: &'static str,
  pub plan: &'static str,
  pub features: &'static [&'static str],
  #[serde(skip_serializing_if = "Option::is_none")]
  pub savings: Option<&'static str>,
  pub highlight: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pricing {
  pub tiers: Vec<PricingTier>,
}

pub fn pricing() -> Pricing {
  let tier = |name, price, period, plan, features| PricingTier {
    name,
    price,
    period,
    plan,
    features,
    savings: None,
    highlight: false,
  };

  Pricing {
    tiers: vec![
      tier("Free", 0.0, "forever", "none", &[
        "Basic system diagnostics",
        "Security status check",
        "AI chat support (limited)",
        "View startup programs",
        "Driver detection only",
      ]),
      PricingTier {
        highlight: true,
        ..tier("5-Day Trial", 0.0, "5 days", "trial", &[
          "Full PC optimization",
          "Speed up your computer",
          "Unlimited AI chat support",
          "All Pro features unlocked",
          "No credit card required",
        ])
      },
      tier("Monthly", 29.99, "month", "monthly", &[
        "Everything in Trial",
        "Driver auto-updates",
        "Advanced optimization",
        "Priority AI support",
        "Performance monitoring",
      ]),
      PricingTier {
        savings: Some("Save $20"),
        ..tier("3 Months", 69.99, "3 months", "quarterly", &[
          "Everything in Monthly",
          "3 months of Pro access",
          "Best value for quarterly",
        ])
      },
      PricingTier {
        savings: Some("Save $80"),
        ..tier("6 Months", 99.99, "6 months", "biannual", &[
          "Everything in Monthly",
          "6 months of Pro access",
          "Great long-term value",
        ])
      },
      PricingTier {
        savings: Some("Save $210"),
        highlight: true,
        ..tier("Annual", 149.99, "year", "annual", &[
          "Everything in Monthly",
          "Full year of Pro access",
          "Best value - 58% off",
          "Priority support",
        ])
      },
    ],
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Current {
  #[serde(flatten)]
  pub subscription: subscription::Model,
  pub can_start_trial: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStarted {
  pub success: bool,
  pub trial_ends_at: DateTime,
  pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activated {
  pub success: bool,
  pub tier: Tier,
  pub expires_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccess {
  pub has_access: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<&'static str>,
  pub current_tier: Tier,
}

impl FeatureAccess {
  fn denied(reason: &'static str, current_tier: Tier) -> Self {
    Self { has_access: false, reason: Some(reason), current_tier }
  }
}

pub struct Subscription<'a> {
  db: &'a DatabaseConnection,
  trial_days: i64,
}

impl<'a> Subscription<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db, trial_days: DEFAULT_TRIAL_DAYS }
  }

  pub fn with_trial_days(mut self, days: i64) -> Self {
    self.trial_days = days;
    self
  }

  pub async fn by_user(
    &self,
    user_id: i32,
  ) -> Result<Option<subscription::Model>> {
    find_by_user(self.db, user_id).await
  }

  /// Returns the user's subscription, creating a free row on first access
  /// and expiring a lapsed trial.
  pub async fn current(&self, user_id: i32) -> Result<Current> {
    let now = Utc::now().naive_utc();

    let Some(sub) = self.by_user(user_id).await? else {
      let sub = blank(user_id, now).insert(self.db).await?;
      return Ok(Current { subscription: sub, can_start_trial: true });
    };

    if sub.tier == Tier::Trial && sub.trial_ends_at.is_some_and(|end| end < now)
    {
      info!("Trial of user {user_id} expired, downgrading to free");
      let sub = subscription::ActiveModel {
        tier: Set(Tier::Free),
        status: Set(SubscriptionStatus::Expired),
        updated_at: Set(now),
        ..sub.into()
      }
      .update(self.db)
      .await?;
      return Ok(Current { subscription: sub, can_start_trial: false });
    }

    let can_start_trial = !sub.has_used_trial && sub.tier == Tier::Free;
    Ok(Current { subscription: sub, can_start_trial })
  }

  /// Trial length: admin settings win over the configured default.
  async fn trial_length(&self) -> Result<i64> {
    let settings = app_settings::Entity::find().one(self.db).await?;
    Ok(
      settings
        .map(|s| s.trial_days as i64)
        .filter(|days| *days > 0)
        .unwrap_or(self.trial_days),
    )
  }

  pub async fn start_trial(&self, user_id: i32) -> Result<TrialStarted> {
    let days = self.trial_length().await?;
    let txn = self.db.begin().await?;

    let existing = find_by_user(&txn, user_id).await?;
    if let Some(sub) = &existing {
      if sub.has_used_trial {
        return Err(Error::Rejected(
          "You have already used your free trial".into(),
        ));
      }
      if sub.tier.is_premium() {
        return Err(Error::Rejected(
          "You already have an active subscription".into(),
        ));
      }
    }

    let now = Utc::now().naive_utc();
    let ends = utils::days_after(now, days)
      .ok_or_else(|| Error::Internal(format!("Trial length out of range: {days}")))?;

    let mut active: subscription::ActiveModel = match existing {
      Some(sub) => sub.into(),
      None => blank(user_id, now),
    };
    active.tier = Set(Tier::Trial);
    active.status = Set(SubscriptionStatus::Trial);
    active.trial_started_at = Set(Some(now));
    active.trial_ends_at = Set(Some(ends));
    active.expires_at = Set(Some(ends));
    active.has_used_trial = Set(true);
    active.updated_at = Set(now);
    active.save(&txn).await?;

    txn.commit().await?;
    info!("User {user_id} started a {days}-day trial");

    Ok(TrialStarted {
      success: true,
      trial_ends_at: ends,
      message: format!(
        "Your {days}-day free trial has started! Enjoy full PC optimization features."
      ),
    })
  }

  pub async fn activate(&self, user_id: i32, key: &str) -> Result<Activated> {
    let key = key.trim();
    if key.len() < MIN_KEY_LEN {
      return Err(Error::InvalidArgs(format!(
        "License key must be at least {MIN_KEY_LEN} characters"
      )));
    }

    let txn = self.db.begin().await?;
    let now = Utc::now().naive_utc();

    let license = license_key::Entity::find()
      .filter(license_key::Column::Key.eq(key))
      .one(&txn)
      .await?
      .ok_or_else(|| Error::Rejected("Invalid license key".into()))?;

    if license.status != license_key::Status::Active {
      return Err(Error::Rejected("License key is not active".into()));
    }
    if license.is_expired(now) {
      return Err(Error::Rejected("License key has expired".into()));
    }
    if !claim_slot(&txn, license.id, now).await? {
      return Err(Error::Rejected(
        "License key has reached maximum activations".into(),
      ));
    }

    let tier: Tier = license.tier.into();
    let mut active: subscription::ActiveModel =
      match find_by_user(&txn, user_id).await? {
        Some(sub) => sub.into(),
        None => blank(user_id, now),
      };
    active.tier = Set(tier);
    active.status = Set(SubscriptionStatus::Active);
    active.license_key = Set(Some(key.to_string()));
    active.expires_at = Set(license.expires_at);
    active.updated_at = Set(now);
    active.save(&txn).await?;

    txn.commit().await?;
    info!("User {user_id} activated license {key} ({tier:?})");

    Ok(Activated { success: true, tier, expires_at: license.expires_at })
  }

  pub async fn check_feature_access(
    &self,
    user_id: i32,
    feature_key: &str,
  ) -> Result<FeatureAccess> {
    let sub = self.by_user(user_id).await?;
    let tier = sub.as_ref().map_or(Tier::Free, |s| s.tier);

    if PREMIUM_FEATURES.contains(&feature_key) && !tier.is_premium() {
      return Ok(FeatureAccess::denied(
        "This feature requires a Pro subscription or active trial",
        tier,
      ));
    }

    if let Some(sub) = &sub {
      if !matches!(
        sub.status,
        SubscriptionStatus::Active | SubscriptionStatus::Trial
      ) {
        return Ok(FeatureAccess::denied(
          "Your subscription is not active",
          tier,
        ));
      }
      if sub.expires_at.is_some_and(|exp| exp < Utc::now().naive_utc()) {
        return Ok(FeatureAccess::denied("Your subscription has expired", tier));
      }
    }

    Ok(FeatureAccess { has_access: true, reason: None, current_tier: tier })
  }

  pub async fn cancel(&self, user_id: i32) -> Result<subscription::Model> {
    let sub = self.by_user(user_id).await?.ok_or_else(|| {
      Error::Rejected("No active subscription found".into())
    })?;

    let sub = subscription::ActiveModel {
      status: Set(SubscriptionStatus::Cancelled),
      updated_at: Set(Utc::now().naive_utc()),
      ..sub.into()
    }
    .update(self.db)
    .await?;

    info!("User {user_id} cancelled the subscription");
    Ok(sub)
  }

  /// Gate for premium-only operations; fails with `message` otherwise.
  pub async fn require_premium(&self, user_id: i32, message: &str) -> Result<()> {
    let premium = self.by_user(user_id).await?.is_some_and(|s| s.tier.is_premium());
    if premium { Ok(()) } else { Err(Error::Premium(message.to_string())) }
  }
}

async fn find_by_user<C: ConnectionTrait>(
  conn: &C,
  user_id: i32,
) -> Result<Option<subscription::Model>> {
  let sub = subscription::Entity::find()
    .filter(subscription::Column::UserId.eq(user_id))
    .one(conn)
    .await?;
  Ok(sub)
}

fn blank(user_id: i32, now: DateTime) -> subscription::ActiveModel {
  subscription::ActiveModel {
    user_id: Set(user_id),
    tier: Set(Tier::Free),
    plan: Set(Plan::None),
    status: Set(SubscriptionStatus::Active),
    license_key: Set(None),
    trial_started_at: Set(None),
    trial_ends_at: Set(None),
    has_used_trial: Set(false),
    expires_at: Set(None),
    created_at: Set(now),
    updated_at: Set(now),
    ..Default::default()
  }
}

/// Takes one activation slot if any is left. The check and the increment
/// are a single statement so concurrent activations cannot overshoot.
pub(crate) async fn claim_slot(
  txn: &DatabaseTransaction,
  license_id: i32,
  now: DateTime,
) -> Result<bool> {
  let result = license_key::Entity::update_many()
    .col_expr(
      license_key::Column::CurrentActivations,
      Expr::col(license_key::Column::CurrentActivations).add(1),
    )
    .col_expr(license_key::Column::UpdatedAt, Expr::value(now))
    .filter(license_key::Column::Id.eq(license_id))
    .filter(
      Expr::col(license_key::Column::CurrentActivations)
        .lt(Expr::col(license_key::Column::MaxActivations)),
    )
    .exec(txn)
    .await?;
  Ok(result.rows_affected == 1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{entity::LicenseTier, sv::testing::*};

  #[tokio::test]
  async fn first_read_creates_free_row() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-1").await;

    let current = Subscription::new(&db).current(user.id).await.unwrap();
    assert_eq!(current.subscription.tier, Tier::Free);
    assert_eq!(current.subscription.status, SubscriptionStatus::Active);
    assert!(current.can_start_trial);
  }

  #[tokio::test]
  async fn trial_can_start_only_once() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-2").await;
    let sv = Subscription::new(&db);

    let started = sv.start_trial(user.id).await.unwrap();
    let span = started.trial_ends_at - Utc::now().naive_utc();
    assert!(span > TimeDelta::days(4) && span <= TimeDelta::days(5));

    let err = sv.start_trial(user.id).await.unwrap_err();
    assert_eq!(err.to_string(), "You have already used your free trial");

    let current = sv.current(user.id).await.unwrap();
    assert_eq!(current.subscription.tier, Tier::Trial);
    assert!(!current.can_start_trial);
  }

  #[tokio::test]
  async fn pro_user_cannot_start_trial() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-3").await;
    let license = crate::sv::License::new(&db)
      .generate(LicenseTier::Pro, 1, None)
      .await
      .unwrap();

    let sv = Subscription::new(&db);
    sv.activate(user.id, &license.key).await.unwrap();

    let err = sv.start_trial(user.id).await.unwrap_err();
    assert_eq!(err.to_string(), "You already have an active subscription");
  }

  #[tokio::test]
  async fn lapsed_trial_expires_on_read() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-4").await;
    let sv = Subscription::new(&db);
    sv.start_trial(user.id).await.unwrap();

    let past = Utc::now().naive_utc() - TimeDelta::hours(1);
    let sub = sv.by_user(user.id).await.unwrap().unwrap();
    subscription::ActiveModel { trial_ends_at: Set(Some(past)), ..sub.into() }
      .update(&db)
      .await
      .unwrap();

    let current = sv.current(user.id).await.unwrap();
    assert_eq!(current.subscription.tier, Tier::Free);
    assert_eq!(current.subscription.status, SubscriptionStatus::Expired);
    assert!(!current.can_start_trial);
    assert!(matches!(sv.start_trial(user.id).await, Err(Error::Rejected(_))));
  }

  #[tokio::test]
  async fn activation_respects_max_activations() {
    let db = setup_test_db().await;
    let a = create_user(&db, "sub-5a").await;
    let b = create_user(&db, "sub-5b").await;
    let license = crate::sv::License::new(&db)
      .generate(LicenseTier::Pro, 1, None)
      .await
      .unwrap();

    let sv = Subscription::new(&db);
    let activated = sv.activate(a.id, &license.key).await.unwrap();
    assert_eq!(activated.tier, Tier::Pro);

    let err = sv.activate(b.id, &license.key).await.unwrap_err();
    assert_eq!(err.to_string(), "License key has reached maximum activations");

    let stored = license_key::Entity::find_by_id(license.id)
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(stored.current_activations, 1);
  }

  #[tokio::test]
  async fn fourth_user_is_refused_on_three_slot_key() {
    let db = setup_test_db().await;
    let license = crate::sv::License::new(&db)
      .generate(LicenseTier::Pro, 3, None)
      .await
      .unwrap();
    let sv = Subscription::new(&db);

    for open_id in ["sub-8a", "sub-8b", "sub-8c"] {
      let user = create_user(&db, open_id).await;
      sv.activate(user.id, &license.key).await.unwrap();
    }

    let fourth = create_user(&db, "sub-8d").await;
    let err = sv.activate(fourth.id, &license.key).await.unwrap_err();
    assert_eq!(err.to_string(), "License key has reached maximum activations");

    let stored = license_key::Entity::find_by_id(license.id)
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(stored.current_activations, 3);
  }

  #[tokio::test]
  async fn activation_rejects_bad_keys() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-6").await;
    let sv = Subscription::new(&db);

    assert!(matches!(
      sv.activate(user.id, "short").await,
      Err(Error::InvalidArgs(_))
    ));
    let err = sv.activate(user.id, "FMAI-0000-0000-0000-0000").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid license key");
  }

  #[tokio::test]
  async fn premium_features_are_gated() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-7").await;
    let sv = Subscription::new(&db);

    let access = sv.check_feature_access(user.id, "driver-updates").await.unwrap();
    assert!(!access.has_access);
    assert_eq!(
      access.reason,
      Some("This feature requires a Pro subscription or active trial")
    );

    let access = sv.check_feature_access(user.id, "diagnostics").await.unwrap();
    assert!(access.has_access);

    let gate = sv.require_premium(user.id, "Fix All requires a Pro subscription or active trial");
    assert!(matches!(gate.await, Err(Error::Premium(_))));

    sv.start_trial(user.id).await.unwrap();
    assert!(sv.check_feature_access(user.id, "auto-fix").await.unwrap().has_access);
    assert!(sv.require_premium(user.id, "unused").await.is_ok());
  }

  #[tokio::test]
  async fn cancelled_subscription_denies_access() {
    let db = setup_test_db().await;
    let user = create_user(&db, "sub-8").await;
    let sv = Subscription::new(&db);

    assert!(matches!(sv.cancel(user.id).await, Err(Error::Rejected(_))));

    sv.start_trial(user.id).await.unwrap();
    sv.cancel(user.id).await.unwrap();

    let access = sv.check_feature_access(user.id, "speed-boost").await.unwrap();
    assert_eq!(access.reason, Some("Your subscription is not active"));
  }
}
