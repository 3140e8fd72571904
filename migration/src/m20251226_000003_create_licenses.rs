use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(LicenseKeys::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LicenseKeys::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(LicenseKeys::Key).string().not_null().unique_key())
          .col(ColumnDef::new(LicenseKeys::Tier).string().not_null().default("pro"))
          .col(
            ColumnDef::new(LicenseKeys::MaxActivations)
              .integer()
              .not_null()
              .default(1),
          )
          .col(
            ColumnDef::new(LicenseKeys::CurrentActivations)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(LicenseKeys::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(ColumnDef::new(LicenseKeys::ExpiresAt).date_time().null())
          .col(ColumnDef::new(LicenseKeys::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(LicenseKeys::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(LicenseActivations::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LicenseActivations::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(LicenseActivations::LicenseKeyId)
              .integer()
              .not_null(),
          )
          .col(ColumnDef::new(LicenseActivations::DeviceId).string().not_null())
          .col(ColumnDef::new(LicenseActivations::UserEmail).string().null())
          .col(ColumnDef::new(LicenseActivations::UserName).string().null())
          .col(
            ColumnDef::new(LicenseActivations::InstallationDate)
              .date_time()
              .not_null(),
          )
          .col(
            ColumnDef::new(LicenseActivations::LastSeenAt)
              .date_time()
              .not_null(),
          )
          .col(
            ColumnDef::new(LicenseActivations::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(
            ColumnDef::new(LicenseActivations::CreatedAt).date_time().not_null(),
          )
          .col(
            ColumnDef::new(LicenseActivations::UpdatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_license_activations_key")
              .from(LicenseActivations::Table, LicenseActivations::LicenseKeyId)
              .to(LicenseKeys::Table, LicenseKeys::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_license_activations_device")
          .table(LicenseActivations::Table)
          .col(LicenseActivations::LicenseKeyId)
          .col(LicenseActivations::DeviceId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(LicenseActivations::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(LicenseKeys::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum LicenseKeys {
  Table,
  Id,
  Key,
  Tier,
  MaxActivations,
  CurrentActivations,
  Status,
  ExpiresAt,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum LicenseActivations {
  Table,
  Id,
  LicenseKeyId,
  DeviceId,
  UserEmail,
  UserName,
  InstallationDate,
  LastSeenAt,
  Status,
  CreatedAt,
  UpdatedAt,
}
