//! Per-user automatic optimization jobs on top of `tokio-cron-scheduler`.

use std::{
  str::FromStr,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use async_trait::async_trait;
use dashmap::DashSet;
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use crate::{optimizer::Optimizer, prelude::*, state::AppState, sv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
  Daily,
  Weekly,
  Monthly,
}

impl Frequency {
  /// Unknown values fall back to weekly.
  pub fn parse(s: &str) -> Self {
    s.parse().unwrap_or(Frequency::Weekly)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Frequency::Daily => "daily",
      Frequency::Weekly => "weekly",
      Frequency::Monthly => "monthly",
    }
  }

  /// Classic five-field form, reported back to clients.
  pub fn cron(self) -> &'static str {
    match self {
      Frequency::Daily => "0 2 * * *",
      Frequency::Weekly => "0 2 * * 0",
      Frequency::Monthly => "0 2 1 * *",
    }
  }

  /// Same schedule with a leading seconds field.
  fn schedule_expr(self) -> &'static str {
    match self {
      Frequency::Daily => "0 0 2 * * *",
      Frequency::Weekly => "0 0 2 * * Sun",
      Frequency::Monthly => "0 0 2 1 * *",
    }
  }
}

impl FromStr for Frequency {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "daily" => Ok(Frequency::Daily),
      "weekly" => Ok(Frequency::Weekly),
      "monthly" => Ok(Frequency::Monthly),
      other => Err(Error::InvalidArgs(format!("Unknown frequency: {other}"))),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJob {
  pub user_id: i32,
  pub frequency: Frequency,
  pub is_running: bool,
  pub next_run: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cancelled {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<&'static str>,
}

struct Entry {
  id: Uuid,
  frequency: Frequency,
}

fn scheduler_error(err: JobSchedulerError) -> Error {
  Error::Internal(format!("scheduler: {err}"))
}

pub struct Scheduler {
  inner: JobScheduler,
  jobs: DashMap<i32, Entry>,
  running: Arc<DashSet<i32>>,
  optimizer: Arc<Optimizer>,
  delay: Duration,
  started: AtomicBool,
}

impl Scheduler {
  pub async fn new(optimizer: Arc<Optimizer>, delay: Duration) -> Result<Self> {
    let inner = JobScheduler::new().await.map_err(scheduler_error)?;
    Ok(Self {
      inner,
      jobs: DashMap::new(),
      running: Arc::new(DashSet::new()),
      optimizer,
      delay,
      started: AtomicBool::new(false),
    })
  }

  /// Registers a job for `user_id`, replacing any previous one.
  pub async fn schedule(
    &self,
    user_id: i32,
    frequency: Frequency,
  ) -> Result<&'static str> {
    self.register(user_id, frequency).await?;
    info!(
      "[user {user_id}] Scheduled {} optimization ({})",
      frequency.as_str(),
      frequency.cron()
    );
    Ok(frequency.cron())
  }

  /// Adds the new job before swapping it into the map, so concurrent calls
  /// for one user each remove whatever entry they displaced.
  async fn register(&self, user_id: i32, frequency: Frequency) -> Result<Uuid> {
    let optimizer = self.optimizer.clone();
    let running = self.running.clone();
    let delay = self.delay;

    let job = Job::new_async(frequency.schedule_expr(), move |_uuid, _lock| {
      let optimizer = optimizer.clone();
      let running = running.clone();
      Box::pin(async move {
        run_optimization(user_id, &optimizer, &running, delay).await;
      })
    })
    .map_err(scheduler_error)?;

    let id = self.inner.add(job).await.map_err(scheduler_error)?;
    if let Some(old) = self.jobs.insert(user_id, Entry { id, frequency }) {
      self.inner.remove(&old.id).await.map_err(scheduler_error)?;
    }
    Ok(id)
  }

  pub async fn cancel(&self, user_id: i32) -> Result<Cancelled> {
    let Some((_, entry)) = self.jobs.remove(&user_id) else {
      return Ok(Cancelled {
        success: false,
        message: Some("No active job found"),
      });
    };

    self.inner.remove(&entry.id).await.map_err(scheduler_error)?;
    info!("[user {user_id}] Cancelled scheduled optimization");
    Ok(Cancelled { success: true, message: None })
  }

  /// Applies a saved automatic settings row.
  pub async fn update(
    &self,
    user_id: i32,
    enabled: bool,
    frequency: &str,
  ) -> Result<()> {
    if enabled {
      self.schedule(user_id, Frequency::parse(frequency)).await?;
    } else {
      self.cancel(user_id).await?;
    }
    Ok(())
  }

  /// Rebuilds jobs from persisted settings. Returns the number registered.
  pub async fn initialize(&self, db: &DatabaseConnection) -> Result<usize> {
    let rows = sv::Automatic::new(db).scheduled().await?;
    for row in &rows {
      self
        .schedule(row.user_id, Frequency::parse(&row.schedule_frequency))
        .await?;
    }
    info!("Restored {} scheduled optimizations", rows.len());
    Ok(rows.len())
  }

  pub async fn start(&self) -> Result<()> {
    if !self.started.swap(true, Ordering::SeqCst) {
      self.inner.start().await.map_err(scheduler_error)?;
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.jobs.len()
  }

  pub async fn active_jobs(&self) -> Vec<ActiveJob> {
    let entries: Vec<(i32, Uuid, Frequency)> = self
      .jobs
      .iter()
      .map(|entry| (*entry.key(), entry.id, entry.frequency))
      .collect();

    let mut jobs = Vec::with_capacity(entries.len());
    for (user_id, id, frequency) in entries {
      let next_run =
        self.inner.clone().next_tick_for_job(id).await.ok().flatten();
      jobs.push(ActiveJob {
        user_id,
        frequency,
        is_running: self.running.contains(&user_id),
        next_run,
      });
    }
    jobs.sort_by_key(|job| job.user_id);
    jobs
  }
}

async fn run_optimization(
  user_id: i32,
  optimizer: &Optimizer,
  running: &DashSet<i32>,
  delay: Duration,
) {
  if !running.insert(user_id) {
    warn!("[user {user_id}] Previous optimization still running, skipping");
    return;
  }

  info!("[user {user_id}] Running scheduled optimization");
  if !delay.is_zero() {
    time::sleep(delay).await;
  }

  let run = optimizer.run_full();
  info!(
    "[user {user_id}] Optimization complete: {} items, {} MB freed",
    run.summary.total_items_cleaned, run.summary.total_space_freed
  );

  running.remove(&user_id);
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "scheduler"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    app.scheduler.initialize(&app.db).await?;
    app.scheduler.start().await?;

    loop {
      time::sleep(Duration::from_secs(3600)).await;
      debug!("{} optimization jobs active", app.scheduler.len());
    }
  }
}
