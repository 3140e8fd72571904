//! Owner-facing Telegram bot. Only ids listed in `ADMIN_IDS` are answered.

mod command;

use std::sync::Arc;

use command::Command;
use teloxide::{
  Bot,
  dispatching::{Dispatcher, HandlerExt, UpdateFilterExt},
  prelude::*,
  types::{ChatId, Message, ParseMode, Update},
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "telegram"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let bot = app.bot.clone().context("Telegram bot is not configured")?;
    run_bot(app, bot).await;
    Ok(())
  }
}

pub async fn run_bot(app: Arc<AppState>, bot: Bot) {
  info!("Starting Telegram bot...");

  let handler = Update::filter_message().filter_command::<Command>().endpoint(
    move |bot: Bot, msg: Message, cmd: Command| {
      let app = app.clone();
      let bot = ReplyBot::new(bot, msg.chat.id.0, msg.chat.id);
      command::handle(app, bot, cmd)
    },
  );

  Dispatcher::builder(bot, handler).build().dispatch().await;
}

#[derive(Debug, Clone)]
struct ReplyBot {
  inner: Bot,
  pub user_id: i64,
  pub chat_id: ChatId,
}

impl ReplyBot {
  pub fn new(inner: Bot, user_id: i64, chat_id: ChatId) -> Self {
    Self { inner, user_id, chat_id }
  }

  async fn reply_html(&self, text: impl Into<String>) -> ResponseResult<()> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .await?;
    Ok(())
  }

  /// Splits long replies at line boundaries to stay under Telegram's limit.
  async fn reply_html_chunked(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<()> {
    for chunk in utils::chunk_message(&text.into(), 0) {
      self.reply_html(chunk).await?;
    }
    Ok(())
  }
}
