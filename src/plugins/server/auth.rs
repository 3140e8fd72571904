use std::sync::Arc;

use axum::{
  Json,
  extract::{FromRequestParts, OptionalFromRequestParts, State},
  http::{HeaderMap, header, request::Parts},
  routing::{get, post},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Done, Routes, done};
use crate::{entity::user, prelude::*, state::AppState};

const TOKEN_LIFETIME_DAYS: i64 = 365;
pub const LOGIN_SECRET_HEADER: &str = "x-login-secret";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub exp: usize,
}

pub fn issue_token(secret: &str, user_id: i32) -> Result<String> {
  let exp = Utc::now() + TimeDelta::days(TOKEN_LIFETIME_DAYS);
  let claims = Claims { sub: user_id.to_string(), exp: exp.timestamp() as usize };

  jsonwebtoken::encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(secret.as_bytes()),
  )
  .map_err(|err| Error::Internal(format!("Failed to sign token: {err}")))
}

fn bearer(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
}

/// Signed-in user resolved from the bearer token.
pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let token = bearer(parts).ok_or(Error::Unauthorized)?;

    let claims = jsonwebtoken::decode::<Claims>(
      token,
      &DecodingKey::from_secret(app.config.jwt_secret.as_bytes()),
      &Validation::default(),
    )
    .map_err(|err| {
      debug!("Rejected token: {err}");
      Error::Unauthorized
    })?
    .claims;

    let id = claims.sub.parse().map_err(|_| Error::Unauthorized)?;
    let user = app.sv().user.by_id(id).await?.ok_or(Error::Unauthorized)?;
    Ok(Self(user))
  }
}

impl OptionalFromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Option<Self>> {
    match <Self as FromRequestParts<_>>::from_request_parts(parts, app).await {
      Ok(user) => Ok(Some(user)),
      Err(Error::Unauthorized) => Ok(None),
      Err(err) => Err(err),
    }
  }
}

pub struct AdminUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AdminUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let AuthUser(user) =
      <AuthUser as FromRequestParts<_>>::from_request_parts(parts, app).await?;
    if !user.is_admin() {
      return Err(Error::Forbidden("Admin access required"));
    }
    Ok(Self(user))
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginReq {
  open_id: String,
  name: Option<String>,
  email: Option<String>,
  login_method: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRes {
  token: String,
  user: user::Model,
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  a.len() == b.len() && a.iter().zip(b).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The sign-in gateway proves itself with the shared login secret.
fn check_login_secret(app: &AppState, headers: &HeaderMap) -> Result<()> {
  let Some(expected) = &app.config.login_secret else {
    return Err(Error::Forbidden("Login is disabled"));
  };

  let given = headers
    .get(LOGIN_SECRET_HEADER)
    .and_then(|value| value.to_str().ok())
    .ok_or(Error::Unauthorized)?;
  if !constant_time_eq(given.as_bytes(), expected.as_bytes()) {
    return Err(Error::Unauthorized);
  }
  Ok(())
}

async fn login(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<LoginReq>,
) -> Result<Json<LoginRes>> {
  check_login_secret(&app, &headers)?;

  let open_id = req.open_id.trim();
  if open_id.is_empty() {
    return Err(Error::InvalidArgs("openId is required".into()));
  }

  let sv = app.sv();
  if sv.user.by_open_id(open_id).await?.is_some_and(|user| user.is_admin()) {
    warn!("Refused gateway login for admin account {open_id}");
    return Err(Error::Forbidden("Admin accounts sign in through the owner bot"));
  }

  let user = sv
    .user
    .upsert(open_id, req.name, req.email, req.login_method)
    .await?;
  let token = issue_token(&app.config.jwt_secret, user.id)?;

  info!("User {} signed in", user.id);
  Ok(Json(LoginRes { token, user }))
}

async fn me(user: Option<AuthUser>) -> Json<Option<user::Model>> {
  Json(user.map(|AuthUser(user)| user))
}

// tokens are stateless; the client drops its copy
async fn logout() -> Json<Done> {
  done()
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/login", post(login))
    .route("/me", get(me))
    .route("/logout", post(logout))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::http::{Method, StatusCode};

  use super::{super::testing::*, LOGIN_SECRET_HEADER};
  use crate::state::{
    AppState, Config,
    tests::{state_with, test_config, test_state},
  };

  async fn gateway_login(
    app: &Arc<AppState>,
    secret: Option<&str>,
    body: json::Value,
  ) -> (StatusCode, json::Value) {
    let headers: Vec<(&str, &str)> =
      secret.map(|secret| (LOGIN_SECRET_HEADER, secret)).into_iter().collect();
    call_with(app, Method::POST, "/api/auth/login", None, &headers, Some(body))
      .await
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn login_then_me() {
    let app = test_state().await;

    let (status, body) = gateway_login(
      &app,
      Some("login-secret"),
      json::json!({ "openId": "oid-login", "name": "Ann" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (_, me) = get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(me["openId"], "oid-login");
    assert_eq!(me["name"], "Ann");

    let (status, anonymous) = get(&app, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(anonymous.is_null());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn login_requires_gateway_secret() {
    let app = test_state().await;
    let body = json::json!({ "openId": "oid-anon" });

    let (status, _) = gateway_login(&app, None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = gateway_login(&app, Some("wrong"), body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.sv().user.by_open_id("oid-anon").await.unwrap().is_none());

    let closed =
      state_with(Config { login_secret: None, ..test_config() }).await;
    let (status, body) = gateway_login(&closed, Some("login-secret"), body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Login is disabled");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn admin_accounts_cannot_use_gateway_login() {
    let app = test_state().await;
    let admin = login_admin(&app, "boss-open-id").await;

    for secret in [None, Some("login-secret")] {
      let (status, body) =
        gateway_login(&app, secret, json::json!({ "openId": "boss-open-id" }))
          .await;
      assert_ne!(status, StatusCode::OK);
      assert!(body.get("token").is_none());
    }

    let (status, body) = gateway_login(
      &app,
      Some("login-secret"),
      json::json!({ "openId": "boss-open-id" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin accounts sign in through the owner bot");

    // the bot-issued token keeps working
    let (status, _) =
      get(&app, "/api/admin/featureFlags/list", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn token_for_missing_user_is_rejected() {
    let app = test_state().await;
    let token = super::issue_token(&app.config.jwt_secret, 4242).unwrap();

    let (status, _) =
      get(&app, "/api/subscriptions/getMySubscription", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }
}
