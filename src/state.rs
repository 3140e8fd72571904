use std::{
  collections::HashSet,
  env,
  path::{Path, PathBuf},
  sync::Arc,
};

use teloxide::{
  Bot,
  prelude::*,
  types::{InputFile, ParseMode},
};
use tokio::fs;

use crate::{
  dashboard, llm, optimizer::Optimizer, plugins::cron::Scheduler, prelude::*,
  sv,
};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub jwt_secret: String,
  pub login_secret: Option<String>,
  pub llm: llm::Config,
  pub dashboard_url: Option<String>,
  pub bot_token: Option<String>,
  pub admins: HashSet<i64>,
  pub reminder_interval: Duration,
  pub fix_delay: Duration,
  pub version_file: PathBuf,
  pub trial_days: i64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:fixmate.db?mode=rwc"),
      port: 3000,
      jwt_secret: String::new(),
      login_secret: None,
      llm: llm::Config::default(),
      dashboard_url: None,
      bot_token: None,
      admins: HashSet::new(),
      reminder_interval: Duration::from_secs(4 * 3600),
      fix_delay: Duration::ZERO,
      version_file: PathBuf::from("version.json"),
      trial_days: sv::subscription::DEFAULT_TRIAL_DAYS,
    }
  }
}

fn var(name: &str) -> Option<String> {
  env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn duration_var(name: &str, default: Duration) -> anyhow::Result<Duration> {
  match var(name) {
    Some(raw) => humantime::parse_duration(raw.trim())
      .with_context(|| format!("Invalid {name}: {raw}")),
    None => Ok(default),
  }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match var(name) {
    Some(raw) => {
      raw.trim().parse().with_context(|| format!("Invalid {name}: {raw}"))
    }
    None => Ok(default),
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Self::default();

    let admins = var("ADMIN_IDS")
      .unwrap_or_default()
      .split(',')
      .filter(|id| !id.trim().is_empty())
      .map(|id| {
        id.trim().parse::<i64>().with_context(|| format!("Invalid admin id: {id}"))
      })
      .collect::<anyhow::Result<_>>()?;

    let llm = llm::Config {
      api_key: var("LLM_API_KEY"),
      base_url: var("LLM_BASE_URL").unwrap_or(defaults.llm.base_url),
      model: var("LLM_MODEL").unwrap_or(defaults.llm.model),
    };

    Ok(Self {
      database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
      port: parse_var("PORT", defaults.port)?,
      jwt_secret: var("JWT_SECRET").context("JWT_SECRET not set")?,
      login_secret: var("LOGIN_SECRET"),
      llm,
      dashboard_url: var("ADMIN_DASHBOARD_URL"),
      bot_token: var("TELOXIDE_TOKEN"),
      admins,
      reminder_interval: duration_var(
        "REMINDER_INTERVAL",
        defaults.reminder_interval,
      )?,
      fix_delay: duration_var("FIX_DELAY", Duration::from_millis(1500))?,
      version_file: var("VERSION_FILE")
        .map(PathBuf::from)
        .unwrap_or(defaults.version_file),
      trial_days: parse_var("TRIAL_DAYS", defaults.trial_days)?,
    })
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub subscription: sv::Subscription<'a>,
  pub license: sv::License<'a>,
  pub metrics: sv::Metrics<'a>,
  pub automatic: sv::Automatic<'a>,
  pub startup: sv::Startup<'a>,
  pub backup: sv::Backup<'a>,
  pub chat: sv::Chat<'a>,
  pub scan: sv::Scan<'a>,
  pub fix: sv::Fix<'a>,
  pub admin: sv::Admin<'a>,
  pub updates: sv::Updates<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub optimizer: Arc<Optimizer>,
  pub scheduler: Scheduler,
  pub llm: llm::Client,
  pub dashboard: dashboard::Client,
  pub bot: Option<Bot>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    migration::Migrator::up(&db, None)
      .await
      .context("Failed to run migrations")?;

    let optimizer = Arc::new(Optimizer::new());
    let scheduler = Scheduler::new(optimizer.clone(), config.fix_delay).await?;
    let llm = llm::Client::new(config.llm.clone())?;
    let dashboard = dashboard::Client::new(config.dashboard_url.clone())?;
    let bot = config.bot_token.as_deref().map(Bot::new);

    if config.llm.api_key.is_none() {
      warn!("LLM_API_KEY not set, the assistant will reject messages");
    }
    if bot.is_none() {
      warn!("TELOXIDE_TOKEN not set, admin notifications go to the log only");
    }
    if config.login_secret.is_none() {
      warn!("LOGIN_SECRET not set, /api/auth/login is disabled");
    }

    Ok(Self { db, config, optimizer, scheduler, llm, dashboard, bot })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      subscription: sv::Subscription::new(&self.db)
        .with_trial_days(self.config.trial_days),
      license: sv::License::new(&self.db),
      metrics: sv::Metrics::new(&self.db),
      automatic: sv::Automatic::new(&self.db),
      startup: sv::Startup::new(&self.db),
      backup: sv::Backup::new(&self.db),
      chat: sv::Chat::new(&self.db, &self.llm),
      scan: sv::Scan::new(&self.db),
      fix: sv::Fix::new(&self.db).with_delay(self.config.fix_delay),
      admin: sv::Admin::new(&self.db),
      updates: sv::Updates::new(&self.db, &self.config.version_file),
    }
  }

  /// Sends HTML `text` to every Telegram admin; without a bot it is only
  /// logged. Returns `false` when no admin received it.
  pub async fn notify_admins(&self, text: &str) -> bool {
    let Some(bot) = &self.bot else {
      info!("Owner notification: {text}");
      return true;
    };

    let mut delivered = false;
    for &admin in &self.config.admins {
      match bot
        .send_message(ChatId(admin), text)
        .parse_mode(ParseMode::Html)
        .await
      {
        Ok(_) => delivered = true,
        Err(err) => warn!("Failed to notify admin {admin}: {err}"),
      }
    }
    delivered
  }

  pub async fn backup(&self, chat_id: ChatId) -> anyhow::Result<()> {
    let bot = self.bot.as_ref().context("Telegram bot is not configured")?;

    let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let path = env::temp_dir().join(format!("fixmate_backup_{timestamp}.db"));
    self.snapshot(&path).await?;

    let sent = bot
      .send_document(chat_id, InputFile::file(path.clone()))
      .caption(format!("📦 <b>Database Backup</b>\nTime: {timestamp}"))
      .parse_mode(ParseMode::Html)
      .await;
    let _ = fs::remove_file(&path).await;

    sent.context("Failed to send backup")?;
    Ok(())
  }

  /// Consistent copy of the SQLite database via `VACUUM INTO`.
  async fn snapshot(&self, path: &Path) -> anyhow::Result<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
      fs::remove_file(path).await?;
    }

    let target = path.to_string_lossy().replace('\'', "''");
    self
      .db
      .execute(sea_orm::Statement::from_string(
        sea_orm::DatabaseBackend::Sqlite,
        format!("VACUUM INTO '{target}'"),
      ))
      .await
      .context("VACUUM INTO failed")?;
    Ok(())
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub fn test_config() -> Config {
    Config {
      database_url: "sqlite::memory:".into(),
      jwt_secret: "test-secret".into(),
      login_secret: Some("login-secret".into()),
      ..Default::default()
    }
  }

  pub async fn test_state() -> Arc<AppState> {
    state_with(test_config()).await
  }

  pub async fn state_with(config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config).await.unwrap())
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn snapshot_writes_database_copy() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let state = state_with(Config {
      database_url: format!("sqlite:{}?mode=rwc", source.display()),
      ..test_config()
    })
    .await;
    let path = dir.path().join("copy.db");

    state.snapshot(&path).await.unwrap();
    assert!(path.exists());
    assert!(state.backup(ChatId(1)).await.is_err());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn services_share_configuration() {
    let state = test_state().await;
    let user = sv::testing::create_user(&state.db, "state-1").await;

    let started = state.sv().subscription.start_trial(user.id).await.unwrap();
    assert!(started.message.starts_with("Your 5-day free trial"));
  }
}
