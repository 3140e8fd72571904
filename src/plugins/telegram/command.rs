use std::sync::Arc;

use teloxide::{
  prelude::*,
  types::ChatId,
  utils::{command::BotCommands, html},
};

use super::ReplyBot;
use crate::{
  entity::{LicenseTier, Role, Tier, license_key, user},
  plugins::server,
  prelude::*,
  state::AppState,
  sv::admin::KeyBatch,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Start,
  Help,
  Gen(String),
  Revoke(String),
  Info(String),
  Promote(String),
  Token(String),
  Users,
  Stats,
  Jobs,
  Backup,
}

const ADMIN_HELP: &str = "\
<b>📋 Admin Commands</b>

<b>License Keys:</b>
/gen &lt;count&gt; &lt;free|pro&gt; [max_activations] [days] - Generate keys
/revoke &lt;key&gt; - Revoke a license key
/info &lt;key&gt; - Show license key and its devices

<b>Accounts:</b>
/promote &lt;openId&gt; - Grant the admin role
/token &lt;openId&gt; - Issue an API token for an account
/users - List recent users with their plan

<b>System:</b>
/stats - Users, subscriptions and keys
/jobs - Scheduled optimizations
/backup - Manual database backup
/help - Show this message";

const GEN_USAGE: &str =
  "Usage: /gen <count> <free|pro> [max_activations] [days]";

fn parse_gen(args: &str) -> Result<KeyBatch> {
  let usage = || Error::InvalidArgs(GEN_USAGE.into());
  let parts: Vec<&str> = args.split_whitespace().collect();

  let (count, tier, rest) = match parts.as_slice() {
    [count, tier, rest @ ..] if rest.len() <= 2 => (count, tier, rest),
    _ => return Err(usage()),
  };

  let count = count.parse::<u32>().map_err(|_| usage())?;
  let tier = match tier.to_lowercase().as_str() {
    "free" => LicenseTier::Free,
    "pro" => LicenseTier::Pro,
    _ => return Err(usage()),
  };
  let max_activations = match rest.first() {
    Some(max) => max.parse::<i32>().map_err(|_| usage())?,
    None => 1,
  };
  let expires_in_days = match rest.get(1) {
    Some(days) => Some(days.parse::<i64>().map_err(|_| usage())?),
    None => None,
  };

  Ok(KeyBatch { count, tier, max_activations, expires_in_days })
}

fn status_icon(license: &license_key::Model, now: DateTime) -> &'static str {
  match license.status {
    license_key::Status::Revoked => "⛔",
    _ if license.expires_at.is_some_and(|at| at < now) => "❌",
    license_key::Status::Expired => "❌",
    license_key::Status::Active => "🟢",
  }
}

async fn info(app: &AppState, key: &str) -> Result<String> {
  let key = key.trim();
  if key.is_empty() {
    return Err(Error::InvalidArgs("Usage: /info <license_key>".into()));
  }

  let sv = app.sv();
  let license =
    sv.license.by_key(key).await?.ok_or(Error::NotFound("License not found"))?;
  let activations = sv.license.activations(license.id).await?;
  let now = Utc::now().naive_utc();

  let expires = match license.expires_at {
    Some(at) if at > now => format!(
      "{} (in {})",
      utils::format_date(at),
      utils::format_duration(at - now)
    ),
    Some(at) => format!("{} (expired)", utils::format_date(at)),
    None => "never".into(),
  };

  let mut text = format!(
    "🔑 <b>License Info</b>\n\n\
    <b>Key:</b> <code>{}</code>\n\
    <b>Tier:</b> {:?}\n\
    <b>Status:</b> {} {:?}\n\
    <b>Created:</b> {}\n\
    <b>Expires:</b> {}\n\n\
    🖥 <b>Activations ({}/{})</b>\n",
    license.key,
    license.tier,
    status_icon(&license, now),
    license.status,
    utils::format_date(license.created_at),
    expires,
    license.current_activations,
    license.max_activations,
  );

  if activations.is_empty() {
    text.push_str(" <i>No devices</i>");
  }
  for (i, device) in activations.iter().enumerate() {
    text.push_str(&format!(
      " {}. <code>{}</code> {:?}\n    {} · last seen {}\n",
      i + 1,
      html::escape(&device.device_id),
      device.status,
      html::escape(device.user_email.as_deref().unwrap_or("no email")),
      utils::format_date(device.last_seen_at),
    ));
  }

  Ok(text)
}

async fn account(app: &AppState, open_id: &str) -> Result<user::Model> {
  let open_id = open_id.trim();
  if open_id.is_empty() {
    return Err(Error::InvalidArgs("Usage: /promote|/token <openId>".into()));
  }
  app.sv().user.by_open_id(open_id).await?.ok_or(Error::NotFound("User not found"))
}

async fn users(app: &AppState) -> Result<String> {
  let rows = app.sv().admin.users(100, 0).await?;
  if rows.is_empty() {
    return Ok("📭 No users yet.".into());
  }

  let mut text = format!("👥 <b>Users (latest {})</b>\n\n", rows.len());
  for (i, row) in rows.iter().enumerate() {
    let tier = row.subscription.as_ref().map_or(Tier::Free, |sub| sub.tier);
    let icon = match tier {
      Tier::Pro => "💎",
      Tier::Trial => "🎁",
      Tier::Free => "⚪",
    };
    let registered = if row.user.is_registered { "✅" } else { "" };
    text.push_str(&format!(
      "<b>{}.</b> {icon} {} {registered} <code>#{}</code> ({} uses)\n",
      i + 1,
      html::escape(row.user.display_name()),
      row.user.id,
      row.user.usage_count,
    ));
  }
  Ok(text)
}

async fn stats(app: &AppState) -> Result<String> {
  let sv = app.sv();
  let (stats, registered, keys, active_keys) = futures::try_join!(
    sv.admin.stats(),
    sv.user.count_registered(),
    sv.license.count(),
    sv.license.count_active(),
  )?;

  Ok(format!(
    "📊 <b>Stats</b>\n\n\
    <b>Users:</b> {} ({registered} registered)\n\
    <b>Free / Pro:</b> {} / {}\n\
    <b>Active subscriptions:</b> {}\n\
    <b>Revenue estimate:</b> ${:.2}\n\n\
    <b>License keys:</b> {active_keys} active of {keys}\n\
    <b>Scheduled optimizations:</b> {}",
    stats.total_users,
    stats.free_users,
    stats.pro_users,
    stats.active_subscriptions,
    stats.revenue,
    app.scheduler.len(),
  ))
}

async fn jobs(app: &AppState) -> String {
  let jobs = app.scheduler.active_jobs().await;
  if jobs.is_empty() {
    return "⏰ No scheduled optimizations.".into();
  }

  let mut text = format!("⏰ <b>Scheduled optimizations ({})</b>\n\n", jobs.len());
  for job in jobs {
    let next = job
      .next_run
      .map(|at| utils::format_date(at.naive_utc()))
      .unwrap_or_else(|| "-".into());
    let state = if job.is_running { "🔄" } else { "💤" };
    text.push_str(&format!(
      "{state} user <code>#{}</code> {} · next {next}\n",
      job.user_id,
      job.frequency.as_str(),
    ));
  }
  text
}

async fn run(app: &AppState, chat_id: ChatId, cmd: Command) -> Result<String> {
  match cmd {
    Command::Start => Ok(
      "<b>FixMate admin bot</b>\n\nOwner notifications arrive here. \
       Use /help for commands."
        .into(),
    ),
    Command::Help => Ok(ADMIN_HELP.into()),
    Command::Gen(args) => {
      let generated = app.sv().admin.generate_keys(parse_gen(&args)?).await?;
      let keys = generated
        .keys
        .iter()
        .map(|key| format!("<code>{key}</code>"))
        .collect::<Vec<_>>()
        .join("\n");
      Ok(format!("✅ Generated {} keys:\n{keys}", generated.generated))
    }
    Command::Revoke(key) => {
      let license = app.sv().license.revoke(key.trim()).await?;
      Ok(format!("🚫 Key revoked: <code>{}</code>", license.key))
    }
    Command::Info(key) => info(app, &key).await,
    Command::Promote(open_id) => {
      let user = account(app, &open_id).await?;
      let user = app.sv().user.set_role(user.id, Role::Admin).await?;
      Ok(format!("👑 {} is now an admin", html::escape(user.display_name())))
    }
    Command::Token(open_id) => {
      let user = account(app, &open_id).await?;
      let token = server::issue_token(&app.config.jwt_secret, user.id)?;
      Ok(format!(
        "🔐 API token for {}:\n<code>{token}</code>",
        html::escape(user.display_name())
      ))
    }
    Command::Users => users(app).await,
    Command::Stats => stats(app).await,
    Command::Jobs => Ok(jobs(app).await),
    Command::Backup => {
      app.backup(chat_id).await.map_err(|err| {
        error!("Backup failed: {err:#}");
        Error::Internal(err.to_string())
      })?;
      Ok("✅ Backup sent".into())
    }
  }
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
) -> ResponseResult<()> {
  if !app.config.admins.contains(&bot.user_id) {
    debug!("Ignoring command from non-admin {}", bot.user_id);
    return Ok(());
  }

  match run(&app, bot.chat_id, cmd).await {
    Ok(text) => bot.reply_html_chunked(text).await?,
    Err(e) => {
      bot.reply_html(format!("❌ {}", html::escape(&e.user_message()))).await?
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::tests::test_state;

  const CHAT: ChatId = ChatId(1);

  #[test]
  fn gen_arguments() {
    let batch = parse_gen("5 pro 3 30").unwrap();
    assert_eq!(batch.count, 5);
    assert_eq!(batch.tier, LicenseTier::Pro);
    assert_eq!(batch.max_activations, 3);
    assert_eq!(batch.expires_in_days, Some(30));

    let batch = parse_gen("1 FREE").unwrap();
    assert_eq!(batch.tier, LicenseTier::Free);
    assert_eq!(batch.max_activations, 1);
    assert_eq!(batch.expires_in_days, None);

    assert!(parse_gen("").is_err());
    assert!(parse_gen("two pro").is_err());
    assert!(parse_gen("2 gold").is_err());
    assert!(parse_gen("2 pro 1 30 extra").is_err());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn gen_then_revoke_then_info() {
    let app = test_state().await;

    let text = run(&app, CHAT, Command::Gen("1 pro 2".into())).await.unwrap();
    let key = text
      .split("<code>")
      .nth(1)
      .and_then(|rest| rest.split("</code>").next())
      .unwrap()
      .to_string();

    let revoked = run(&app, CHAT, Command::Revoke(key.clone())).await.unwrap();
    assert!(revoked.contains(&key));

    let info = run(&app, CHAT, Command::Info(key)).await.unwrap();
    assert!(info.contains("Revoked"));
    assert!(info.contains("(0/2)"));

    let err =
      run(&app, CHAT, Command::Info("FM-MISSING".into())).await.unwrap_err();
    assert_eq!(err.user_message(), "License not found");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn stats_and_jobs_render() {
    let app = test_state().await;
    crate::sv::testing::create_user(&app.db, "someone").await;

    let text = run(&app, CHAT, Command::Stats).await.unwrap();
    assert!(text.contains("<b>Users:</b> 1"));

    let text = run(&app, CHAT, Command::Jobs).await.unwrap();
    assert!(text.contains("No scheduled optimizations"));

    let text = run(&app, CHAT, Command::Users).await.unwrap();
    assert!(text.contains("someone"));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn promote_then_token_grants_admin_api() {
    use axum::http::StatusCode;

    use crate::plugins::server::testing::get;

    let app = test_state().await;
    crate::sv::testing::create_user(&app.db, "owner").await;

    let err = run(&app, CHAT, Command::Token("ghost".into())).await.unwrap_err();
    assert_eq!(err.user_message(), "User not found");

    let text = run(&app, CHAT, Command::Promote("owner".into())).await.unwrap();
    assert!(text.contains("is now an admin"));

    let text = run(&app, CHAT, Command::Token("owner".into())).await.unwrap();
    let token = text
      .split("<code>")
      .nth(1)
      .and_then(|rest| rest.split("</code>").next())
      .unwrap();

    let (status, _) = get(&app, "/api/admin/featureFlags/list", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn user_supplied_text_is_escaped() {
    let app = test_state().await;
    crate::sv::testing::create_user(&app.db, "<x").await;

    let text = run(&app, CHAT, Command::Users).await.unwrap();
    assert!(text.contains("&lt;x"));
    assert!(!text.contains("<x"));

    let license = app
      .sv()
      .license
      .generate(LicenseTier::Pro, 1, None)
      .await
      .unwrap();
    app
      .sv()
      .license
      .validate(
        &license.key,
        crate::sv::license::Device {
          id: "pc<1>",
          email: Some("a&b@example.com".into()),
          name: None,
          installation_date: Utc::now().naive_utc(),
        },
      )
      .await
      .unwrap();

    let info = run(&app, CHAT, Command::Info(license.key)).await.unwrap();
    assert!(info.contains("pc&lt;1&gt;"));
    assert!(info.contains("a&amp;b@example.com"));
  }
}
