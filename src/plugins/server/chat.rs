use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  routing::{get, post},
};
use serde::Deserialize;

use super::{AuthUser, Done, Routes, done};
use crate::{
  prelude::*,
  state::AppState,
  sv::chat::{Conversation, Preview, Sent, SystemContext},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendReq {
  message: String,
  conversation_id: Option<i32>,
  system_context: Option<SystemContext>,
}

async fn send(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<SendReq>,
) -> Result<Json<Sent>> {
  if req.message.trim().is_empty() {
    return Err(Error::InvalidArgs("Message must not be empty".into()));
  }

  let sent = app
    .sv()
    .chat
    .send(user.id, &req.message, req.conversation_id, req.system_context)
    .await?;
  Ok(Json(sent))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationReq {
  conversation_id: i32,
}

async fn conversation(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Query(req): Query<ConversationReq>,
) -> Result<Json<Conversation>> {
  Ok(Json(app.sv().chat.conversation(user.id, req.conversation_id).await?))
}

async fn conversations(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Vec<Preview>>> {
  Ok(Json(app.sv().chat.conversations(user.id).await?))
}

async fn archive(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<ConversationReq>,
) -> Result<Json<Done>> {
  app.sv().chat.archive(user.id, req.conversation_id).await?;
  Ok(done())
}

pub fn routes() -> Routes {
  Routes::new()
    .route("/sendMessage", post(send))
    .route("/getConversation", get(conversation))
    .route("/getMyConversations", get(conversations))
    .route("/archiveConversation", post(archive))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use super::super::testing::*;
  use crate::{
    llm,
    state::tests::{state_with, test_config},
  };

  #[tokio::test(flavor = "multi_thread")]
  async fn tool_call_triggers_action() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/chat/completions")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        json::json!({
          "choices": [{
            "message": {
              "role": "assistant",
              "content": null,
              "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": { "name": "run_system_scan", "arguments": "{}" }
              }]
            }
          }]
        })
        .to_string(),
      )
      .create_async()
      .await;

    let mut config = test_config();
    config.llm = llm::tests::config(server.url());
    let app = state_with(config).await;
    let (_, token) = login(&app, "chatter").await;

    let (status, sent) = post(
      &app,
      "/api/chat/sendMessage",
      Some(&token),
      json::json!({ "message": "scan please" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["actionTriggered"]["action"], "run_system_scan");

    let id = sent["conversationId"].as_i64().unwrap();
    let (_, list) =
      get(&app, "/api/chat/getMyConversations", Some(&token)).await;
    assert_eq!(list[0]["messageCount"], 2);

    let (_, stranger) = login(&app, "stranger").await;
    let (status, body) = get(
      &app,
      &format!("/api/chat/getConversation?conversationId={id}"),
      Some(&stranger),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Conversation not found");
  }
}
