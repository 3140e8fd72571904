//! Device-bound license keys (`FMAI-XXXX-XXXX-XXXX-XXXX`).

use serde::Serialize;

use crate::{
  entity::{LicenseTier, license_activation, license_key},
  prelude::*,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
  pub tier: LicenseTier,
  pub expires_at: Option<DateTime>,
}

impl From<&license_key::Model> for Grant {
  fn from(license: &license_key::Model) -> Self {
    Self { tier: license.tier, expires_at: license.expires_at }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Validation {
  pub success: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license: Option<Grant>,
}

impl Validation {
  fn failed(message: impl Into<String>) -> Self {
    Self { success: false, message: message.into(), license: None }
  }

  fn granted(message: &str, license: &license_key::Model) -> Self {
    Self {
      success: true,
      message: message.to_string(),
      license: Some(license.into()),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Check {
  pub valid: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license: Option<Grant>,
}

#[derive(Debug, Clone)]
pub struct Device<'a> {
  pub id: &'a str,
  pub email: Option<String>,
  pub name: Option<String>,
  pub installation_date: DateTime,
}

pub struct License<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> License<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_key(&self, key: &str) -> Result<Option<license_key::Model>> {
    let license = license_key::Entity::find()
      .filter(license_key::Column::Key.eq(key))
      .one(self.db)
      .await?;
    Ok(license)
  }

  /// Status, expiry and slot checks shared by `validate` and `check`.
  fn usable(license: &license_key::Model, now: DateTime) -> Option<String> {
    if license.status != license_key::Status::Active {
      return Some(format!("License is {}", license.status.as_str()));
    }
    if license.is_expired(now) {
      return Some("License has expired".into());
    }
    None
  }

  pub async fn validate(&self, key: &str, device: Device<'_>) -> Result<Validation> {
    let now = Utc::now().naive_utc();
    let txn = self.db.begin().await?;

    let Some(license) = license_key::Entity::find()
      .filter(license_key::Column::Key.eq(key))
      .one(&txn)
      .await?
    else {
      return Ok(Validation::failed("Invalid license key"));
    };

    if let Some(reason) = Self::usable(&license, now) {
      return Ok(Validation::failed(reason));
    }

    let existing = license_activation::Entity::find()
      .filter(license_activation::Column::LicenseKeyId.eq(license.id))
      .filter(license_activation::Column::DeviceId.eq(device.id))
      .one(&txn)
      .await?;

    if let Some(activation) = existing {
      if activation.status == license_activation::Status::Revoked {
        return Ok(Validation::failed(
          "License activation was revoked for this device",
        ));
      }

      license_activation::ActiveModel {
        last_seen_at: Set(now),
        user_email: Set(device.email),
        user_name: Set(device.name),
        updated_at: Set(now),
        ..activation.into()
      }
      .update(&txn)
      .await?;
      txn.commit().await?;

      return Ok(Validation::granted(
        "License already activated on this device",
        &license,
      ));
    }

    if !super::subscription::claim_slot(&txn, license.id, now).await? {
      return Ok(Validation::failed(format!(
        "Maximum activations ({}) reached for this license",
        license.max_activations
      )));
    }

    license_activation::ActiveModel {
      license_key_id: Set(license.id),
      device_id: Set(device.id.to_string()),
      user_email: Set(device.email),
      user_name: Set(device.name),
      installation_date: Set(device.installation_date),
      last_seen_at: Set(now),
      status: Set(license_activation::Status::Active),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("License {key} activated on device {}", device.id);
    Ok(Validation::granted("License activated successfully", &license))
  }

  pub async fn check(&self, key: &str, device_id: &str) -> Result<Check> {
    let now = Utc::now().naive_utc();
    let invalid = |message: &str| Check {
      valid: false,
      message: message.to_string(),
      license: None,
    };

    let Some(license) = self.by_key(key).await? else {
      return Ok(invalid("Invalid license key"));
    };
    if let Some(reason) = Self::usable(&license, now) {
      return Ok(invalid(&reason));
    }

    let Some(activation) = license_activation::Entity::find()
      .filter(license_activation::Column::LicenseKeyId.eq(license.id))
      .filter(license_activation::Column::DeviceId.eq(device_id))
      .filter(
        license_activation::Column::Status
          .eq(license_activation::Status::Active),
      )
      .one(self.db)
      .await?
    else {
      return Ok(invalid("License not activated on this device"));
    };

    license_activation::ActiveModel {
      last_seen_at: Set(now),
      ..activation.into()
    }
    .update(self.db)
    .await?;

    Ok(Check {
      valid: true,
      message: "License is valid".into(),
      license: Some((&license).into()),
    })
  }

  pub async fn generate(
    &self,
    tier: LicenseTier,
    max_activations: i32,
    expires_at: Option<DateTime>,
  ) -> Result<license_key::Model> {
    if max_activations < 1 {
      return Err(Error::InvalidArgs(
        "maxActivations must be at least 1".into(),
      ));
    }

    let now = Utc::now().naive_utc();
    let license = license_key::ActiveModel {
      key: Set(utils::device_license_key()),
      tier: Set(tier),
      max_activations: Set(max_activations),
      current_activations: Set(0),
      status: Set(license_key::Status::Active),
      expires_at: Set(expires_at),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!("Generated {tier:?} license {}", license.key);
    Ok(license)
  }

  pub async fn all(&self) -> Result<Vec<license_key::Model>> {
    let licenses = license_key::Entity::find()
      .order_by_desc(license_key::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(licenses)
  }

  pub async fn activations(
    &self,
    license_key_id: i32,
  ) -> Result<Vec<license_activation::Model>> {
    let activations = license_activation::Entity::find()
      .filter(license_activation::Column::LicenseKeyId.eq(license_key_id))
      .all(self.db)
      .await?;
    Ok(activations)
  }

  pub async fn revoke(&self, key: &str) -> Result<license_key::Model> {
    let license =
      self.by_key(key).await?.ok_or(Error::NotFound("License not found"))?;

    let license = license_key::ActiveModel {
      status: Set(license_key::Status::Revoked),
      updated_at: Set(Utc::now().naive_utc()),
      ..license.into()
    }
    .update(self.db)
    .await?;

    info!("Revoked license {key}");
    Ok(license)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(license_key::Entity::find().count(self.db).await?)
  }

  pub async fn count_active(&self) -> Result<u64> {
    let count = license_key::Entity::find()
      .filter(license_key::Column::Status.eq(license_key::Status::Active))
      .count(self.db)
      .await?;
    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::*;

  fn device(id: &str) -> Device<'_> {
    Device {
      id,
      email: Some("owner@example.com".into()),
      name: None,
      installation_date: Utc::now().naive_utc(),
    }
  }

  #[tokio::test]
  async fn generated_keys_have_device_format() {
    let db = setup_test_db().await;
    let license =
      License::new(&db).generate(LicenseTier::Pro, 2, None).await.unwrap();

    assert!(license.key.starts_with("FMAI-"));
    assert_eq!(license.key.len(), 24);
    assert_eq!(license.current_activations, 0);
    assert!(matches!(
      License::new(&db).generate(LicenseTier::Pro, 0, None).await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn same_device_does_not_consume_slot() {
    let db = setup_test_db().await;
    let sv = License::new(&db);
    let license = sv.generate(LicenseTier::Pro, 1, None).await.unwrap();

    let first = sv.validate(&license.key, device("pc-1")).await.unwrap();
    assert!(first.success);
    assert_eq!(first.message, "License activated successfully");

    let again = sv.validate(&license.key, device("pc-1")).await.unwrap();
    assert!(again.success);
    assert_eq!(again.message, "License already activated on this device");

    let other = sv.validate(&license.key, device("pc-2")).await.unwrap();
    assert!(!other.success);
    assert_eq!(
      other.message,
      "Maximum activations (1) reached for this license"
    );

    let stored = sv.by_key(&license.key).await.unwrap().unwrap();
    assert_eq!(stored.current_activations, 1);
    assert_eq!(sv.activations(license.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn three_devices_fill_three_slots() {
    let db = setup_test_db().await;
    let sv = License::new(&db);
    let license = sv.generate(LicenseTier::Pro, 3, None).await.unwrap();

    for id in ["pc-1", "pc-2", "pc-3"] {
      assert!(sv.validate(&license.key, device(id)).await.unwrap().success);
    }

    let fourth = sv.validate(&license.key, device("pc-4")).await.unwrap();
    assert!(!fourth.success);
    assert_eq!(
      fourth.message,
      "Maximum activations (3) reached for this license"
    );

    // known devices still pass at the cap
    assert!(sv.validate(&license.key, device("pc-2")).await.unwrap().success);

    let stored = sv.by_key(&license.key).await.unwrap().unwrap();
    assert_eq!(stored.current_activations, 3);
    assert_eq!(sv.activations(license.id).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn revoked_and_expired_keys_fail() {
    let db = setup_test_db().await;
    let sv = License::new(&db);

    let revoked = sv.generate(LicenseTier::Pro, 1, None).await.unwrap();
    sv.revoke(&revoked.key).await.unwrap();
    let res = sv.validate(&revoked.key, device("pc")).await.unwrap();
    assert_eq!(res.message, "License is revoked");

    let past = Utc::now().naive_utc() - TimeDelta::days(1);
    let expired = sv.generate(LicenseTier::Pro, 1, Some(past)).await.unwrap();
    let res = sv.validate(&expired.key, device("pc")).await.unwrap();
    assert!(!res.success);
    assert_eq!(res.message, "License has expired");

    let res = sv.validate("FMAI-NOPE", device("pc")).await.unwrap();
    assert_eq!(res.message, "Invalid license key");
  }

  #[tokio::test]
  async fn check_requires_activation() {
    let db = setup_test_db().await;
    let sv = License::new(&db);
    let license = sv.generate(LicenseTier::Free, 3, None).await.unwrap();

    let res = sv.check(&license.key, "pc").await.unwrap();
    assert!(!res.valid);
    assert_eq!(res.message, "License not activated on this device");

    sv.validate(&license.key, device("pc")).await.unwrap();
    let res = sv.check(&license.key, "pc").await.unwrap();
    assert!(res.valid);
    assert_eq!(res.license.unwrap().tier, LicenseTier::Free);
  }
}
