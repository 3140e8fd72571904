//! Install trial evaluated for the desktop shell.
//!
//! Unrelated to the subscription trial: this is a 180-day window counted
//! from the installation date, after which premium features are locked
//! unless a license key is present. The shell persists its own state and
//! asks the server to evaluate it.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const TRIAL_DAYS: i64 = 180;
pub const PROMPT_INTERVAL_HOURS: i64 = 4;

pub const LOCKABLE_FEATURES: &[&str] = &[
  "optimize",
  "analyze",
  "clean",
  "extended",
  "automatic",
  "backups",
  "ai-assistant",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallState {
  pub installation_date: Option<DateTime>,
  pub last_prompt_at: Option<DateTime>,
  #[serde(default)]
  pub registered: bool,
  pub license_key: Option<String>,
}

impl InstallState {
  fn has_license(&self) -> bool {
    self.license_key.as_deref().is_some_and(|key| !key.trim().is_empty())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatus {
  pub is_trial_active: bool,
  pub is_registered: bool,
  pub has_license: bool,
  pub days_remaining: i64,
  pub should_show_registration_prompt: bool,
  pub installation_date: Option<DateTime>,
  pub locked_features: Vec<&'static str>,
}

fn should_prompt(state: &InstallState, now: DateTime) -> bool {
  if state.registered {
    return false;
  }
  let Some(installed) = state.installation_date else {
    return false;
  };

  let interval = TimeDelta::hours(PROMPT_INTERVAL_HOURS);

  // quiet during the first hours after install
  if now - installed < interval {
    return false;
  }

  state.last_prompt_at.is_none_or(|last| now - last >= interval)
}

pub fn evaluate(state: &InstallState, now: DateTime) -> TrialStatus {
  let has_license = state.has_license();

  let Some(installed) = state.installation_date else {
    return TrialStatus {
      is_trial_active: true,
      is_registered: state.registered,
      has_license,
      days_remaining: TRIAL_DAYS,
      should_show_registration_prompt: false,
      installation_date: None,
      locked_features: Vec::new(),
    };
  };

  let elapsed = now - installed;
  let is_trial_active =
    elapsed < TimeDelta::days(TRIAL_DAYS) || has_license;

  let locked_features = if is_trial_active {
    Vec::new()
  } else {
    LOCKABLE_FEATURES.to_vec()
  };

  TrialStatus {
    is_trial_active,
    is_registered: state.registered,
    has_license,
    days_remaining: (TRIAL_DAYS - elapsed.num_days()).max(0),
    should_show_registration_prompt: should_prompt(state, now),
    installation_date: Some(installed),
    locked_features,
  }
}

pub fn is_feature_locked(status: &TrialStatus, feature: &str) -> bool {
  let feature = feature.to_lowercase();
  status.locked_features.iter().any(|f| *f == feature)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn state(days_ago: i64) -> (InstallState, DateTime) {
    let now = Utc::now().naive_utc();
    let state = InstallState {
      installation_date: Some(now - TimeDelta::days(days_ago)),
      ..Default::default()
    };
    (state, now)
  }

  #[test]
  fn fresh_install_is_active() {
    let (state, now) = state(10);
    let status = evaluate(&state, now);

    assert!(status.is_trial_active);
    assert_eq!(status.days_remaining, 170);
    assert!(!is_feature_locked(&status, "optimize"));
  }

  #[test]
  fn expired_install_locks_premium() {
    let (state, now) = state(200);
    let status = evaluate(&state, now);

    assert!(!status.is_trial_active);
    assert_eq!(status.days_remaining, 0);
    assert!(is_feature_locked(&status, "AI-Assistant"));
    assert!(!is_feature_locked(&status, "dashboard"));
  }

  #[test]
  fn license_unlocks_after_expiry() {
    let (mut state, now) = state(200);
    state.license_key = Some("FMAI-AAAA-BBBB-CCCC-DDDD".into());

    let status = evaluate(&state, now);
    assert!(status.is_trial_active);
    assert!(status.locked_features.is_empty());
  }

  #[test]
  fn prompt_cadence() {
    let now = Utc::now().naive_utc();
    let mut state = InstallState {
      installation_date: Some(now - TimeDelta::hours(2)),
      ..Default::default()
    };
    assert!(!evaluate(&state, now).should_show_registration_prompt);

    state.installation_date = Some(now - TimeDelta::days(1));
    assert!(evaluate(&state, now).should_show_registration_prompt);

    state.last_prompt_at = Some(now - TimeDelta::hours(1));
    assert!(!evaluate(&state, now).should_show_registration_prompt);

    state.last_prompt_at = Some(now - TimeDelta::hours(5));
    assert!(evaluate(&state, now).should_show_registration_prompt);

    state.registered = true;
    assert!(!evaluate(&state, now).should_show_registration_prompt);
  }
}
