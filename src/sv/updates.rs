//! Desktop release metadata: the running build's `version.json` and the
//! newest stable release published through the admin panel.

use std::{cmp::Ordering, path::Path};

use serde::{Deserialize, Serialize};

use crate::{entity::app_update::ReleaseType, prelude::*, sv};

const BUILTIN_VERSION: &str = "1.0.0";
const BUILTIN_RELEASE_DATE: &str = "2025-12-26";
const BUILTIN_DOWNLOAD_URL: &str =
  "https://github.com/fixmate-ai/fixmate/releases/latest/download/fixmate-setup.exe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
  pub version: String,
  pub release_date: String,
  pub release_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Latest {
  pub version: String,
  pub release_date: String,
  pub release_notes: String,
  pub download_url: String,
  pub min_version: String,
  pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
  pub has_update: bool,
  pub current_version: String,
  pub latest_version: String,
  pub release_date: String,
  pub release_notes: String,
  pub download_url: String,
}

async fn read_version(path: &Path) -> anyhow::Result<VersionInfo> {
  let raw = tokio::fs::read_to_string(path).await?;
  Ok(json::from_str(&raw)?)
}

pub struct Updates<'a> {
  db: &'a DatabaseConnection,
  version_file: &'a Path,
}

impl<'a> Updates<'a> {
  pub fn new(db: &'a DatabaseConnection, version_file: &'a Path) -> Self {
    Self { db, version_file }
  }

  /// Reads `version.json`; a missing or malformed file yields the built-in
  /// release.
  pub async fn current_version(&self) -> VersionInfo {
    read_version(self.version_file).await.unwrap_or_else(|err| {
      warn!("Reading {} failed: {err:#}", self.version_file.display());
      VersionInfo {
        version: BUILTIN_VERSION.into(),
        release_date: Utc::now().format("%Y-%m-%d").to_string(),
        release_notes: "Initial release".into(),
      }
    })
  }

  pub async fn latest_version(&self) -> Result<Latest> {
    let release =
      sv::Admin::new(self.db).latest_release(Some(ReleaseType::Stable)).await?;

    Ok(match release {
      Some(release) => Latest {
        version: release.version,
        release_date: release.released_at.format("%Y-%m-%d").to_string(),
        release_notes: release.changelog,
        download_url: release.download_url,
        min_version: BUILTIN_VERSION.into(),
        critical: release.mandatory,
      },
      None => Latest {
        version: BUILTIN_VERSION.into(),
        release_date: BUILTIN_RELEASE_DATE.into(),
        release_notes: "Initial release of FixMate AI - System optimization \
          and troubleshooting tool"
          .into(),
        download_url: BUILTIN_DOWNLOAD_URL.into(),
        min_version: BUILTIN_VERSION.into(),
        critical: false,
      },
    })
  }

  pub async fn check(&self, current_version: &str) -> Result<UpdateCheck> {
    let latest = self.latest_version().await?;
    let has_update =
      utils::compare_versions(current_version, &latest.version)
        == Ordering::Less;

    Ok(UpdateCheck {
      has_update,
      current_version: current_version.to_string(),
      latest_version: latest.version,
      release_date: latest.release_date,
      release_notes: latest.release_notes,
      download_url: latest.download_url,
    })
  }
}
