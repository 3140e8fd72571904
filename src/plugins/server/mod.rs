//! JSON RPC surface: `/api/{router}/{procedure}`, queries as `GET` with a
//! query string and mutations as `POST` with a JSON body.

mod admin;
mod auth;
mod automatic;
mod backups;
mod chat;
mod dashboard;
mod diagnostics;
mod fixes;
mod license;
mod metrics;
mod optimizer;
mod processes;
mod startup;
mod subscriptions;
mod trial;
mod updates;
mod user;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use self::auth::{AdminUser, AuthUser};
pub use self::auth::issue_token;
use crate::{prelude::*, state::AppState};

type Routes = Router<Arc<AppState>>;

#[derive(Debug, Serialize)]
pub struct Done {
  pub success: bool,
}

pub fn done() -> Json<Done> {
  Json(Done { success: true })
}

/// Application routes without the per-connection layers.
pub fn routes(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api/auth", auth::routes())
    .nest("/api/diagnostics", diagnostics::routes())
    .nest("/api/subscriptions", subscriptions::routes())
    .nest("/api/chat", chat::routes())
    .nest("/api/admin", admin::routes())
    .nest("/api/fixes", fixes::routes())
    .nest("/api/metrics", metrics::routes())
    .nest("/api/user", user::routes())
    .nest("/api/optimizer", optimizer::routes())
    .nest("/api/updates", updates::routes())
    .nest("/api/automatic", automatic::routes())
    .nest("/api/startup", startup::routes())
    .nest("/api/processes", processes::routes())
    .nest("/api/backups", backups::routes())
    .nest("/api/admin-dashboard", dashboard::routes())
    .nest("/api/license", license::routes())
    .nest("/api/trial", trial::routes())
    .with_state(app)
}

async fn health() -> &'static str {
  "OK"
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "http"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = routes(app)
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}
