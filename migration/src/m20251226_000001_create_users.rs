use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Users::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Users::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Users::OpenId).string().not_null().unique_key())
          .col(ColumnDef::new(Users::Name).string().null())
          .col(ColumnDef::new(Users::Email).string().null())
          .col(ColumnDef::new(Users::LoginMethod).string().null())
          .col(ColumnDef::new(Users::Role).string().not_null().default("user"))
          .col(ColumnDef::new(Users::Phone).string().null())
          .col(ColumnDef::new(Users::RegisteredAt).date_time().null())
          .col(
            ColumnDef::new(Users::IsRegistered)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(Users::UsageCount).integer().not_null().default(0),
          )
          .col(ColumnDef::new(Users::LastUsedAt).date_time().null())
          .col(ColumnDef::new(Users::LastNotificationSentAt).date_time().null())
          .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Users::UpdatedAt).date_time().not_null())
          .col(ColumnDef::new(Users::LastSignedIn).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Users {
  Table,
  Id,
  OpenId,
  Name,
  Email,
  LoginMethod,
  Role,
  Phone,
  RegisteredAt,
  IsRegistered,
  UsageCount,
  LastUsedAt,
  LastNotificationSentAt,
  CreatedAt,
  UpdatedAt,
  LastSignedIn,
}
