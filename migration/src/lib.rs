//! Database migrations using SeaORM

pub use sea_orm_migration::prelude::*;

mod m20251226_000001_create_users;
mod m20251226_000002_create_subscriptions;
mod m20251226_000003_create_licenses;
mod m20251226_000004_create_admin_tables;
mod m20251226_000005_create_performance_snapshots;
mod m20251226_000006_create_automatic_settings;
mod m20251226_000007_create_startup_programs;
mod m20251226_000008_create_system_backups;
mod m20251226_000009_create_chat_and_scans;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20251226_000001_create_users::Migration),
      Box::new(m20251226_000002_create_subscriptions::Migration),
      Box::new(m20251226_000003_create_licenses::Migration),
      Box::new(m20251226_000004_create_admin_tables::Migration),
      Box::new(m20251226_000005_create_performance_snapshots::Migration),
      Box::new(m20251226_000006_create_automatic_settings::Migration),
      Box::new(m20251226_000007_create_startup_programs::Migration),
      Box::new(m20251226_000008_create_system_backups::Migration),
      Box::new(m20251226_000009_create_chat_and_scans::Migration),
    ]
  }
}
