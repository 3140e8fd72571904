//! Periodic owner notifications about users who keep using the app without
//! registering.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::utils::html;

use crate::{entity::user, prelude::*, state::AppState};

fn reminder_text(user: &user::Model) -> String {
  format!(
    "👤 User {} (Usage: {} times) hasn't registered yet. \
     Consider reaching out.",
    html::escape(user.display_name()),
    user.usage_count
  )
}

/// Notifies about every user due for a reminder; returns how many were sent.
pub async fn sweep(app: &AppState) -> Result<usize> {
  let interval = TimeDelta::from_std(app.config.reminder_interval)
    .map_err(|err| Error::Internal(err.to_string()))?;
  let cutoff = Utc::now().naive_utc() - interval;

  let sv = app.sv();
  let due = sv.user.due_for_reminder(cutoff).await?;

  let mut sent = 0;
  for user in &due {
    // undelivered reminders stay due for the next sweep
    if app.notify_admins(&reminder_text(user)).await {
      sv.user.touch_notification(user.id).await?;
      sent += 1;
    }
  }

  if sent > 0 {
    info!("Sent {sent} registration reminders");
  }
  Ok(sent)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "reminders"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let period = app.config.reminder_interval.max(Duration::from_secs(60));
    let mut ticker = time::interval(period);
    loop {
      ticker.tick().await;
      if let Err(err) = sweep(&app).await {
        warn!("Registration reminder sweep failed: {err}");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{state::tests::test_state, sv::testing::create_user};

  #[tokio::test(flavor = "multi_thread")]
  async fn reminds_once_per_interval() {
    let app = test_state().await;
    let pending = create_user(&app.db, "pending").await;
    let done = create_user(&app.db, "done").await;
    app
      .sv()
      .user
      .register(done.id, "Bo".into(), "bo@example.com".into(), "1".into())
      .await
      .unwrap();

    assert_eq!(sweep(&app).await.unwrap(), 1);
    let stamped = app.sv().user.by_id(pending.id).await.unwrap().unwrap();
    assert!(stamped.last_notification_sent_at.is_some());

    // stamped within the interval
    assert_eq!(sweep(&app).await.unwrap(), 0);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn reminder_escapes_user_names() {
    let app = test_state().await;
    let user = create_user(&app.db, "<b>Eve & co</b>").await;

    let text = reminder_text(&user);
    assert!(text.contains("&lt;b&gt;Eve &amp; co&lt;/b&gt;"));
    assert!(!text.contains("<b>"));
  }
}
