pub mod admin;
pub mod automatic;
pub mod backup;
pub mod chat;
pub mod fix;
pub mod license;
pub mod metrics;
pub mod scan;
pub mod startup;
pub mod subscription;
pub mod updates;
pub mod user;

pub use admin::Admin;
pub use automatic::Automatic;
pub use backup::Backup;
pub use chat::Chat;
pub use fix::Fix;
pub use license::License;
pub use metrics::Metrics;
pub use scan::Scan;
pub use startup::Startup;
pub use subscription::Subscription;
pub use updates::Updates;
pub use user::User;

#[cfg(test)]
pub(crate) mod testing {
  use crate::{entity::user, prelude::*};

  pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
  }

  pub async fn create_user(db: &DatabaseConnection, open_id: &str) -> user::Model {
    super::User::new(db)
      .upsert(open_id, Some(open_id.to_string()), None, None)
      .await
      .unwrap()
  }
}
