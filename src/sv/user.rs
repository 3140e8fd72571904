use crate::{
  entity::{Role, user},
  prelude::*,
};

/// Usage count after which unregistered users get the registration prompt.
pub const REGISTRATION_PROMPT_AFTER: i32 = 2;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
  pub usage_count: i32,
  pub should_show_registration: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
  pub is_registered: bool,
  pub usage_count: i32,
  pub should_show_registration: bool,
}

fn should_prompt(user: &user::Model) -> bool {
  !user.is_registered && user.usage_count >= REGISTRATION_PROMPT_AFTER
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Creates the user on first sign-in, refreshes profile fields after.
  pub async fn upsert(
    &self,
    open_id: &str,
    name: Option<String>,
    email: Option<String>,
    login_method: Option<String>,
  ) -> Result<user::Model> {
    let now = Utc::now().naive_utc();

    if let Some(user) = self.by_open_id(open_id).await? {
      let mut active: user::ActiveModel = user.into();
      if name.is_some() {
        active.name = Set(name);
      }
      if email.is_some() {
        active.email = Set(email);
      }
      if login_method.is_some() {
        active.login_method = Set(login_method);
      }
      active.last_signed_in = Set(now);
      active.updated_at = Set(now);
      return Ok(active.update(self.db).await?);
    }

    let user = user::ActiveModel {
      open_id: Set(open_id.to_string()),
      name: Set(name),
      email: Set(email),
      login_method: Set(login_method),
      role: Set(Role::User),
      phone: Set(None),
      registered_at: Set(None),
      is_registered: Set(false),
      usage_count: Set(0),
      last_used_at: Set(None),
      last_notification_sent_at: Set(None),
      created_at: Set(now),
      updated_at: Set(now),
      last_signed_in: Set(now),
      ..Default::default()
    };

    Ok(user.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn by_open_id(&self, open_id: &str) -> Result<Option<user::Model>> {
    let user = user::Entity::find()
      .filter(user::Column::OpenId.eq(open_id))
      .one(self.db)
      .await?;
    Ok(user)
  }

  async fn get(&self, id: i32) -> Result<user::Model> {
    self.by_id(id).await?.ok_or(Error::NotFound("User not found"))
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(user::Entity::find().count(self.db).await?)
  }

  pub async fn count_registered(&self) -> Result<u64> {
    let count = user::Entity::find()
      .filter(user::Column::IsRegistered.eq(true))
      .count(self.db)
      .await?;
    Ok(count)
  }

  pub async fn set_role(&self, id: i32, role: Role) -> Result<user::Model> {
    let user = self.get(id).await?;
    let model = user::ActiveModel {
      role: Set(role),
      updated_at: Set(Utc::now().naive_utc()),
      ..user.into()
    }
    .update(self.db)
    .await?;
    Ok(model)
  }

  pub async fn register(
    &self,
    id: i32,
    name: String,
    email: String,
    phone: String,
  ) -> Result<user::Model> {
    if name.trim().is_empty() {
      return Err(Error::InvalidArgs("Name is required".into()));
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
      return Err(Error::InvalidArgs("Invalid email address".into()));
    }
    if phone.trim().is_empty() {
      return Err(Error::InvalidArgs("Phone number is required".into()));
    }

    let user = self.get(id).await?;
    let now = Utc::now().naive_utc();

    let model = user::ActiveModel {
      name: Set(Some(name)),
      email: Set(Some(email)),
      phone: Set(Some(phone)),
      is_registered: Set(true),
      registered_at: Set(Some(now)),
      updated_at: Set(now),
      ..user.into()
    }
    .update(self.db)
    .await?;
    Ok(model)
  }

  pub async fn track_usage(&self, id: i32) -> Result<Usage> {
    let user = self.get(id).await?;
    let now = Utc::now().naive_utc();

    let user = user::ActiveModel {
      usage_count: Set(user.usage_count + 1),
      last_used_at: Set(Some(now)),
      updated_at: Set(now),
      ..user.into()
    }
    .update(self.db)
    .await?;

    Ok(Usage {
      usage_count: user.usage_count,
      should_show_registration: should_prompt(&user),
    })
  }

  pub async fn registration_status(&self, id: i32) -> Result<RegistrationStatus> {
    let status = match self.by_id(id).await? {
      Some(user) => RegistrationStatus {
        is_registered: user.is_registered,
        usage_count: user.usage_count,
        should_show_registration: should_prompt(&user),
      },
      None => RegistrationStatus {
        is_registered: false,
        usage_count: 0,
        should_show_registration: false,
      },
    };
    Ok(status)
  }

  pub async fn touch_notification(&self, id: i32) -> Result<()> {
    let now = Utc::now().naive_utc();
    user::Entity::update_many()
      .col_expr(user::Column::LastNotificationSentAt, Expr::value(now))
      .col_expr(user::Column::UpdatedAt, Expr::value(now))
      .filter(user::Column::Id.eq(id))
      .exec(self.db)
      .await?;
    Ok(())
  }

  /// Unregistered users not reminded about since `cutoff`.
  pub async fn due_for_reminder(
    &self,
    cutoff: DateTime,
  ) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .filter(user::Column::IsRegistered.eq(false))
      .filter(
        Condition::any()
          .add(user::Column::LastNotificationSentAt.is_null())
          .add(user::Column::LastNotificationSentAt.lt(cutoff)),
      )
      .all(self.db)
      .await?;
    Ok(users)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::*;

  #[tokio::test]
  async fn upsert_is_idempotent() {
    let db = setup_test_db().await;
    let sv = User::new(&db);

    let first = sv.upsert("oid-1", Some("Ann".into()), None, None).await.unwrap();
    let second = sv
      .upsert("oid-1", None, Some("ann@example.com".into()), None)
      .await
      .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name.as_deref(), Some("Ann"));
    assert_eq!(second.email.as_deref(), Some("ann@example.com"));
    assert_eq!(sv.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn registration_prompt_after_second_use() {
    let db = setup_test_db().await;
    let user = create_user(&db, "oid-2").await;
    let sv = User::new(&db);

    assert!(!sv.track_usage(user.id).await.unwrap().should_show_registration);
    let usage = sv.track_usage(user.id).await.unwrap();
    assert_eq!(usage.usage_count, 2);
    assert!(usage.should_show_registration);

    sv.register(user.id, "Ann".into(), "ann@example.com".into(), "555".into())
      .await
      .unwrap();
    let status = sv.registration_status(user.id).await.unwrap();
    assert!(status.is_registered);
    assert!(!status.should_show_registration);
  }

  #[tokio::test]
  async fn register_validates_input() {
    let db = setup_test_db().await;
    let user = create_user(&db, "oid-3").await;

    let result = User::new(&db)
      .register(user.id, "Ann".into(), "not-an-email".into(), "555".into())
      .await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn reminders_skip_recently_notified() {
    let db = setup_test_db().await;
    let a = create_user(&db, "oid-a").await;
    let b = create_user(&db, "oid-b").await;
    let sv = User::new(&db);

    sv.touch_notification(a.id).await.unwrap();

    let cutoff = Utc::now().naive_utc() - TimeDelta::hours(4);
    let due = sv.due_for_reminder(cutoff).await.unwrap();
    assert_eq!(due.iter().map(|u| u.id).collect::<Vec<_>>(), vec![b.id]);
  }
}
