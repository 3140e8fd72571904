use sea_orm_migration::prelude::*;

use super::m20251226_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(SystemBackups::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SystemBackups::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(SystemBackups::UserId).integer().not_null())
          .col(ColumnDef::new(SystemBackups::Name).string().not_null())
          .col(ColumnDef::new(SystemBackups::Description).text().null())
          .col(ColumnDef::new(SystemBackups::SystemState).json().not_null())
          .col(ColumnDef::new(SystemBackups::DiagnosticsSnapshot).json().null())
          .col(ColumnDef::new(SystemBackups::MetricsSnapshot).json().null())
          .col(
            ColumnDef::new(SystemBackups::SizeMb).integer().not_null().default(0),
          )
          .col(
            ColumnDef::new(SystemBackups::BackupType)
              .string()
              .not_null()
              .default("manual"),
          )
          .col(
            ColumnDef::new(SystemBackups::Status)
              .string()
              .not_null()
              .default("creating"),
          )
          .col(ColumnDef::new(SystemBackups::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_system_backups_user")
              .from(SystemBackups::Table, SystemBackups::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(SystemBackups::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum SystemBackups {
  Table,
  Id,
  UserId,
  Name,
  Description,
  SystemState,
  DiagnosticsSnapshot,
  MetricsSnapshot,
  SizeMb,
  BackupType,
  Status,
  CreatedAt,
}
