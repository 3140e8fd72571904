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
          .table(Subscriptions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Subscriptions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Subscriptions::UserId)
              .integer()
              .not_null()
              .unique_key(),
          )
          .col(
            ColumnDef::new(Subscriptions::Tier)
              .string()
              .not_null()
              .default("free"),
          )
          .col(
            ColumnDef::new(Subscriptions::Plan)
              .string()
              .not_null()
              .default("none"),
          )
          .col(
            ColumnDef::new(Subscriptions::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(ColumnDef::new(Subscriptions::LicenseKey).string().null())
          .col(ColumnDef::new(Subscriptions::TrialStartedAt).date_time().null())
          .col(ColumnDef::new(Subscriptions::TrialEndsAt).date_time().null())
          .col(
            ColumnDef::new(Subscriptions::HasUsedTrial)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Subscriptions::ExpiresAt).date_time().null())
          .col(ColumnDef::new(Subscriptions::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Subscriptions::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_subscriptions_user")
              .from(Subscriptions::Table, Subscriptions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_subscriptions_license_key")
          .table(Subscriptions::Table)
          .col(Subscriptions::LicenseKey)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Subscriptions {
  Table,
  Id,
  UserId,
  Tier,
  Plan,
  Status,
  LicenseKey,
  TrialStartedAt,
  TrialEndsAt,
  HasUsedTrial,
  ExpiresAt,
  CreatedAt,
  UpdatedAt,
}
