//! Troubleshooting assistant conversations backed by the LLM client.

use serde::{Deserialize, Serialize};

use crate::{
  entity::chat_conversation::{self, Status},
  llm,
  prelude::*,
};

const HISTORY_WINDOW: usize = 10;
const FALLBACK_REPLY: &str = "I understand. How can I help you with that?";

const SYSTEM_PROMPT: &str = "You are FixMate AI, a helpful PC troubleshooting \
assistant. You help users diagnose and fix computer problems, optimize \
performance, and maintain system health.

Your capabilities include:
- Diagnosing slow PC performance
- Identifying security issues
- Recommending driver updates
- Troubleshooting printer problems
- General computer and Windows support

Be concise, friendly, and solution-oriented. Provide step-by-step \
instructions when appropriate.";

const OPTIMIZATION_REPLY: &str = "I'll start optimizing your system right \
away! This will clean up junk files, temporary data, and free up disk space. \
You can monitor the progress in the optimization window.";

const SCAN_REPLY: &str = "I'll run a comprehensive system scan to check for \
issues and identify optimization opportunities. This will take a moment...";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuContext {
  pub usage: f64,
  pub cores: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageContext {
  pub usage_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemContext {
  pub cpu: Option<CpuContext>,
  pub memory: Option<UsageContext>,
  pub disk: Option<UsageContext>,
  pub recent_scan: Option<json::Value>,
}

impl SystemContext {
  fn describe(&self) -> String {
    let mut out = String::from("\n\nCurrent system status:");
    if let Some(cpu) = self.cpu {
      out += &format!("\n- CPU: {}% usage, {} cores", cpu.usage, cpu.cores);
    }
    if let Some(memory) = self.memory {
      out += &format!("\n- Memory: {}% used", memory.usage_percent);
    }
    if let Some(disk) = self.disk {
      out += &format!("\n- Disk: {}% used", disk.usage_percent);
    }
    out
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
  pub role: String,
  pub content: String,
  pub timestamp: String,
}

impl Turn {
  fn now(role: &str, content: String) -> Self {
    Self { role: role.into(), content, timestamp: Utc::now().to_rfc3339() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
  pub action: String,
  pub parameters: json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sent {
  pub conversation_id: i32,
  pub message: Option<String>,
  pub timestamp: String,
  pub action_triggered: Option<Action>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
  pub id: i32,
  pub user_id: i32,
  pub messages: Vec<Turn>,
  pub system_context: Option<json::Value>,
  pub status: Status,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
  pub id: i32,
  pub status: Status,
  pub created_at: DateTime,
  pub updated_at: DateTime,
  pub message_count: usize,
  pub last_message: String,
}

fn turns(model: &chat_conversation::Model) -> Vec<Turn> {
  json::from_value(model.messages.clone()).unwrap_or_default()
}

/// Maps the model's reply to the text shown to the user and the client-side
/// action, if the model asked for one.
fn interpret(reply: &llm::Reply) -> (Option<String>, Option<Action>) {
  let Some(call) = reply.first_tool_call() else {
    return (reply.content.clone(), None);
  };

  let message = match call.name.as_str() {
    llm::RUN_OPTIMIZATION => Some(OPTIMIZATION_REPLY.to_string()),
    llm::RUN_SCAN => Some(SCAN_REPLY.to_string()),
    _ => reply.content.clone(),
  };
  let action =
    Action { action: call.name.clone(), parameters: call.parameters() };
  (message, Some(action))
}

pub struct Chat<'a> {
  db: &'a DatabaseConnection,
  llm: &'a llm::Client,
}

impl<'a> Chat<'a> {
  pub fn new(db: &'a DatabaseConnection, llm: &'a llm::Client) -> Self {
    Self { db, llm }
  }

  async fn owned(
    &self,
    user_id: i32,
    id: i32,
  ) -> Result<chat_conversation::Model> {
    chat_conversation::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .filter(|conv| conv.user_id == user_id)
      .ok_or(Error::NotFound("Conversation not found"))
  }

  pub async fn send(
    &self,
    user_id: i32,
    message: &str,
    conversation_id: Option<i32>,
    context: Option<SystemContext>,
  ) -> Result<Sent> {
    if message.trim().is_empty() {
      return Err(Error::InvalidArgs("Message must not be empty".into()));
    }

    let existing = match conversation_id {
      Some(id) => Some(self.owned(user_id, id).await?),
      None => None,
    };

    let mut history = existing.as_ref().map(turns).unwrap_or_default();
    history.push(Turn::now("user", message.to_string()));

    let mut prompt = SYSTEM_PROMPT.to_string();
    if let Some(context) = &context {
      prompt += &context.describe();
    }

    let mut messages = vec![llm::Message::system(prompt)];
    let skip = history.len().saturating_sub(HISTORY_WINDOW);
    messages.extend(history.iter().skip(skip).map(|turn| llm::Message {
      role: turn.role.clone(),
      content: turn.content.clone(),
    }));

    let reply = self.llm.complete(&messages).await.map_err(|err| {
      warn!("Assistant request failed for user {user_id}: {err}");
      match err {
        Error::Rejected(_) => err,
        other => Error::Rejected(format!(
          "Failed to get AI response: {}",
          other.user_message()
        )),
      }
    })?;

    let (text, action) = interpret(&reply);
    history.push(Turn::now(
      "assistant",
      text.clone().unwrap_or_else(|| FALLBACK_REPLY.into()),
    ));

    let now = Utc::now().naive_utc();
    let messages = json::to_value(&history)?;
    let context = context.map(json::to_value).transpose()?;

    let conversation = match existing {
      Some(conv) => {
        chat_conversation::ActiveModel {
          messages: Set(messages),
          system_context: Set(context),
          updated_at: Set(now),
          ..conv.into()
        }
        .update(self.db)
        .await?
      }
      None => {
        chat_conversation::ActiveModel {
          user_id: Set(user_id),
          messages: Set(messages),
          system_context: Set(context),
          status: Set(Status::Active),
          created_at: Set(now),
          updated_at: Set(now),
          ..Default::default()
        }
        .insert(self.db)
        .await?
      }
    };

    if let Some(action) = &action {
      info!("Assistant triggered {} for user {user_id}", action.action);
    }

    Ok(Sent {
      conversation_id: conversation.id,
      message: text,
      timestamp: Utc::now().to_rfc3339(),
      action_triggered: action,
    })
  }

  pub async fn conversation(&self, user_id: i32, id: i32) -> Result<Conversation> {
    let conv = self.owned(user_id, id).await?;
    Ok(Conversation {
      id: conv.id,
      user_id: conv.user_id,
      messages: turns(&conv),
      system_context: conv.system_context,
      status: conv.status,
      created_at: conv.created_at,
      updated_at: conv.updated_at,
    })
  }

  pub async fn conversations(&self, user_id: i32) -> Result<Vec<Preview>> {
    let convs = chat_conversation::Entity::find()
      .filter(chat_conversation::Column::UserId.eq(user_id))
      .order_by_desc(chat_conversation::Column::UpdatedAt)
      .limit(20)
      .all(self.db)
      .await?;

    Ok(
      convs
        .iter()
        .map(|conv| {
          let turns = turns(conv);
          Preview {
            id: conv.id,
            status: conv.status,
            created_at: conv.created_at,
            updated_at: conv.updated_at,
            message_count: turns.len(),
            last_message: turns
              .last()
              .map(|turn| turn.content.clone())
              .unwrap_or_default(),
          }
        })
        .collect(),
    )
  }

  pub async fn archive(&self, user_id: i32, id: i32) -> Result<()> {
    let conv = self.owned(user_id, id).await?;
    chat_conversation::ActiveModel {
      status: Set(Status::Archived),
      updated_at: Set(Utc::now().naive_utc()),
      ..conv.into()
    }
    .update(self.db)
    .await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use mockito::Matcher;

  use super::*;
  use crate::sv::testing::*;

  fn completion(body: &str) -> String {
    format!(r#"{{"choices":[{{"message":{body}}}]}}"#)
  }

  async fn llm_replying(server: &mut mockito::Server, body: &str) -> llm::Client {
    server
      .mock("POST", "/chat/completions")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(completion(body))
      .create_async()
      .await;
    llm::Client::new(llm::tests::config(server.url())).unwrap()
  }

  #[tokio::test]
  async fn plain_reply_is_stored() {
    let db = setup_test_db().await;
    let user = create_user(&db, "chat-1").await;
    let mut server = mockito::Server::new_async().await;
    let llm = llm_replying(
      &mut server,
      r#"{"role":"assistant","content":"Try restarting."}"#,
    )
    .await;
    let chat = Chat::new(&db, &llm);

    let sent = chat.send(user.id, "My PC is slow", None, None).await.unwrap();
    assert_eq!(sent.message.as_deref(), Some("Try restarting."));
    assert!(sent.action_triggered.is_none());

    let again = chat
      .send(user.id, "Still slow", Some(sent.conversation_id), None)
      .await
      .unwrap();
    assert_eq!(again.conversation_id, sent.conversation_id);

    let conv = chat.conversation(user.id, sent.conversation_id).await.unwrap();
    assert_eq!(conv.messages.len(), 4);
    assert_eq!(conv.messages[0].role, "user");
    assert_eq!(conv.messages[3].content, "Try restarting.");

    let previews = chat.conversations(user.id).await.unwrap();
    assert_eq!(previews[0].message_count, 4);
    assert_eq!(previews[0].last_message, "Try restarting.");
  }

  #[tokio::test]
  async fn tool_call_triggers_action() {
    let db = setup_test_db().await;
    let user = create_user(&db, "chat-2").await;
    let mut server = mockito::Server::new_async().await;
    let llm = llm_replying(
      &mut server,
      r#"{"role":"assistant","content":null,"tool_calls":[{"id":"1",
      "type":"function","function":{"name":"run_system_optimization",
      "arguments":"{\"categories\":[\"browsing\"]}"}}]}"#,
    )
    .await;

    let sent = Chat::new(&db, &llm)
      .send(user.id, "Clean my PC", None, None)
      .await
      .unwrap();

    assert_eq!(sent.message.as_deref(), Some(OPTIMIZATION_REPLY));
    assert_eq!(
      sent.action_triggered,
      Some(Action {
        action: llm::RUN_OPTIMIZATION.into(),
        parameters: json::json!({ "categories": ["browsing"] }),
      })
    );
  }

  #[tokio::test]
  async fn empty_reply_falls_back() {
    let db = setup_test_db().await;
    let user = create_user(&db, "chat-3").await;
    let mut server = mockito::Server::new_async().await;
    let llm =
      llm_replying(&mut server, r#"{"role":"assistant","content":null}"#).await;
    let chat = Chat::new(&db, &llm);

    let sent = chat.send(user.id, "hello", None, None).await.unwrap();
    assert_eq!(sent.message, None);

    let conv = chat.conversation(user.id, sent.conversation_id).await.unwrap();
    assert_eq!(conv.messages[1].content, FALLBACK_REPLY);
  }

  #[tokio::test]
  async fn system_context_reaches_prompt() {
    let db = setup_test_db().await;
    let user = create_user(&db, "chat-4").await;
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/chat/completions")
      .match_body(Matcher::Regex("CPU: 91% usage, 4 cores".into()))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(completion(r#"{"role":"assistant","content":"ok"}"#))
      .create_async()
      .await;
    let llm = llm::Client::new(llm::tests::config(server.url())).unwrap();

    let context = SystemContext {
      cpu: Some(CpuContext { usage: 91.0, cores: 4 }),
      ..Default::default()
    };
    Chat::new(&db, &llm)
      .send(user.id, "why so hot", None, Some(context))
      .await
      .unwrap();
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn foreign_conversations_are_hidden() {
    let db = setup_test_db().await;
    let owner = create_user(&db, "chat-5a").await;
    let other = create_user(&db, "chat-5b").await;
    let mut server = mockito::Server::new_async().await;
    let llm =
      llm_replying(&mut server, r#"{"role":"assistant","content":"hi"}"#).await;
    let chat = Chat::new(&db, &llm);

    let sent = chat.send(owner.id, "hello", None, None).await.unwrap();
    let id = sent.conversation_id;

    let err = chat.conversation(other.id, id).await.unwrap_err();
    assert_eq!(err.to_string(), "Conversation not found");
    assert!(chat.send(other.id, "hijack", Some(id), None).await.is_err());
    assert!(chat.archive(other.id, id).await.is_err());

    chat.archive(owner.id, id).await.unwrap();
    let conv = chat.conversation(owner.id, id).await.unwrap();
    assert_eq!(conv.status, Status::Archived);
  }
}
