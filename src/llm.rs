//! OpenAI-compatible chat completions client with tool calling

use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const DEFAULT_BASE_URL: &str = "https://api.sambanova.ai/v1";
pub const DEFAULT_MODEL: &str = "Meta-Llama-3.1-8B-Instruct";

pub const RUN_OPTIMIZATION: &str = "run_system_optimization";
pub const RUN_SCAN: &str = "run_system_scan";

#[derive(Debug, Clone)]
pub struct Config {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_BASE_URL.into(),
      model: DEFAULT_MODEL.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub role: String,
  pub content: String,
}

impl Message {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: "system".into(), content: content.into() }
  }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
  model: &'a str,
  messages: &'a [Message],
  tools: json::Value,
  tool_choice: &'static str,
}

#[derive(Debug, Deserialize)]
struct Response {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: Reply,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reply {
  pub content: Option<String>,
  #[serde(default)]
  pub tool_calls: Option<Vec<ToolCall>>,
}

impl Reply {
  pub fn first_tool_call(&self) -> Option<&FunctionCall> {
    self.tool_calls.as_ref()?.first().map(|call| &call.function)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
  pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
  pub name: String,
  /// JSON-encoded arguments; may be empty.
  #[serde(default)]
  pub arguments: Option<String>,
}

impl FunctionCall {
  pub fn parameters(&self) -> json::Value {
    self
      .arguments
      .as_deref()
      .filter(|args| !args.trim().is_empty())
      .and_then(|args| json::from_str(args).ok())
      .unwrap_or_else(|| json::json!({}))
  }
}

fn tools() -> json::Value {
  json::json!([
    {
      "type": "function",
      "function": {
        "name": RUN_OPTIMIZATION,
        "description": "Run a full system optimization to clean junk files, \
          temporary files, registry entries, and free up disk space. Use this \
          when user asks to clean, optimize, or speed up their PC.",
        "parameters": {
          "type": "object",
          "properties": {
            "categories": {
              "type": "array",
              "items": {
                "type": "string",
                "enum": [
                  "browsing", "registry", "files", "privacy",
                  "shortcuts", "services", "settings", "recycle"
                ]
              },
              "description": "Categories to optimize. If not specified, \
                optimize all categories."
            }
          }
        }
      }
    },
    {
      "type": "function",
      "function": {
        "name": RUN_SCAN,
        "description": "Run a system diagnostic scan to check for issues, \
          analyze performance, and identify optimization opportunities. Use \
          this when user asks to scan or analyze their system.",
        "parameters": { "type": "object", "properties": {} }
      }
    }
  ])
}

pub struct Client {
  http: reqwest::Client,
  config: Config,
}

impl Client {
  pub fn new(config: Config) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { http, config })
  }

  pub async fn complete(&self, messages: &[Message]) -> Result<Reply> {
    let Some(api_key) = self.config.api_key.as_deref() else {
      return Err(Error::Rejected("AI assistant is not configured".into()));
    };

    let url =
      format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
    let request = Request {
      model: &self.config.model,
      messages,
      tools: tools(),
      tool_choice: "auto",
    };

    debug!("LLM request with {} messages", messages.len());
    let response: Response = self
      .http
      .post(url)
      .bearer_auth(api_key)
      .json(&request)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    response
      .choices
      .into_iter()
      .next()
      .map(|choice| choice.message)
      .ok_or_else(|| Error::Internal("LLM returned no choices".into()))
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub fn config(base_url: String) -> Config {
    Config {
      api_key: Some("test-key".into()),
      base_url,
      model: DEFAULT_MODEL.into(),
    }
  }

  #[tokio::test]
  async fn parses_tool_calls() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/chat/completions")
      .match_header("authorization", "Bearer test-key")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"{"choices":[{"message":{"role":"assistant","content":null,
        "tool_calls":[{"id":"call_1","type":"function","function":
        {"name":"run_system_scan","arguments":"{}"}}]}}]}"#,
      )
      .create_async()
      .await;

    let client = Client::new(config(server.url())).unwrap();
    let reply = client.complete(&[Message::system("hi")]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.content, None);
    let call = reply.first_tool_call().unwrap();
    assert_eq!(call.name, RUN_SCAN);
    assert_eq!(call.parameters(), json::json!({}));
  }

  #[tokio::test]
  async fn upstream_failure_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/chat/completions")
      .with_status(500)
      .create_async()
      .await;

    let client = Client::new(config(server.url())).unwrap();
    let result = client.complete(&[Message::system("hi")]).await;

    assert!(matches!(result, Err(Error::Upstream(_))));
  }

  #[tokio::test]
  async fn missing_key_is_rejected() {
    let client = Client::new(Config::default()).unwrap();
    let result = client.complete(&[]).await;
    assert!(matches!(result, Err(Error::Rejected(_))));
  }
}
