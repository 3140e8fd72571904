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
          .table(ChatConversations::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ChatConversations::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(ChatConversations::UserId).integer().not_null())
          .col(ColumnDef::new(ChatConversations::Messages).json().not_null())
          .col(ColumnDef::new(ChatConversations::SystemContext).json().null())
          .col(
            ColumnDef::new(ChatConversations::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(
            ColumnDef::new(ChatConversations::CreatedAt).date_time().not_null(),
          )
          .col(
            ColumnDef::new(ChatConversations::UpdatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_chat_conversations_user")
              .from(ChatConversations::Table, ChatConversations::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(SystemScans::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SystemScans::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(SystemScans::UserId).integer().not_null())
          .col(ColumnDef::new(SystemScans::ScanType).string().not_null())
          .col(ColumnDef::new(SystemScans::Results).json().not_null())
          .col(
            ColumnDef::new(SystemScans::IssuesFound)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(SystemScans::Status)
              .string()
              .not_null()
              .default("running"),
          )
          .col(ColumnDef::new(SystemScans::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_system_scans_user")
              .from(SystemScans::Table, SystemScans::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(SystemScans::Table).to_owned()).await?;
    manager
      .drop_table(Table::drop().table(ChatConversations::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ChatConversations {
  Table,
  Id,
  UserId,
  Messages,
  SystemContext,
  Status,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum SystemScans {
  Table,
  Id,
  UserId,
  ScanType,
  Results,
  IssuesFound,
  Status,
  CreatedAt,
}
