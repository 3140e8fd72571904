//! Long-running services. Each plugin runs in its own task and is restarted
//! after a delay (5 s by default) whenever it returns or crashes.

pub mod cron;
pub mod reminders;
pub mod server;
pub mod telegram;

use std::sync::Arc;

use tokio::task::{AbortHandle, JoinSet};

use crate::{prelude::*, state::AppState};

const RESTART_DELAY: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str;

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
  restart_delay: Duration,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new(), restart_delay: RESTART_DELAY }
  }

  pub fn restart_delay(mut self, delay: Duration) -> Self {
    self.restart_delay = delay;
    self
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub fn register_if<P: Plugin + 'static>(self, enabled: bool, plugin: P) -> Self {
    if enabled { self.register(plugin) } else { self }
  }

  /// Spawns a supervisor per plugin. Dropping or aborting the returned set
  /// stops every plugin.
  pub fn spawn(self, app: Arc<AppState>) -> JoinSet<()> {
    let mut set = JoinSet::new();
    for plugin in self.plugins {
      set.spawn(supervise(plugin, app.clone(), self.restart_delay));
    }
    set
  }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
  fn drop(&mut self) {
    self.0.abort();
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>, delay: Duration) {
  let name = plugin.name();
  info!("Plugin `{name}` started");

  for restarts in 1u64.. {
    let task = tokio::spawn({
      let (plugin, app) = (plugin.clone(), app.clone());
      async move { plugin.start(app).await }
    });
    let _guard = AbortOnDrop(task.abort_handle());

    match task.await {
      Ok(Ok(())) => warn!("Plugin `{name}` returned without error"),
      Ok(Err(err)) => error!("Plugin `{name}` failed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!("Plugin `{name}` cancelled");
        return;
      }
      Err(_) => error!("Plugin `{name}` panicked"),
    }

    time::sleep(delay).await;
    info!("Restarting plugin `{name}` (restart #{restarts})");
  }
}
