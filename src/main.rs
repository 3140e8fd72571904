//! FixMate server: subscriptions and device licenses, scheduled simulated
//! optimizations, the chat assistant bridge and an owner bot.

mod dashboard;
mod diagnostics;
mod entity;
mod error;
mod llm;
mod optimizer;
mod plugins;
mod prelude;
mod state;
mod sv;
mod system;
mod trial;
mod utils;

use std::sync::Arc;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, cron, reminders, server, telegram},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "fixmate=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  info!("Starting FixMate server v{}", env!("CARGO_PKG_VERSION"));

  let config = Config::from_env()?;
  let state = Arc::new(AppState::new(config).await?);

  let mut plugins = App::new()
    .register(server::Plugin)
    .register(cron::Plugin)
    .register(reminders::Plugin)
    .register_if(state.bot.is_some(), telegram::Plugin)
    .spawn(state);

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");
  plugins.shutdown().await;
  Ok(())
}
