use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(FeatureFlags::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(FeatureFlags::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(FeatureFlags::FlagKey).string().not_null().unique_key(),
          )
          .col(ColumnDef::new(FeatureFlags::FlagName).string().not_null())
          .col(ColumnDef::new(FeatureFlags::Description).text().null())
          .col(
            ColumnDef::new(FeatureFlags::Enabled)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(FeatureFlags::RequiresPro)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(FeatureFlags::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(FeatureFlags::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(AppUpdates::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AppUpdates::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(AppUpdates::Version).string().not_null().unique_key())
          .col(ColumnDef::new(AppUpdates::Changelog).text().not_null())
          .col(ColumnDef::new(AppUpdates::DownloadUrl).string().not_null())
          .col(
            ColumnDef::new(AppUpdates::ReleaseType)
              .string()
              .not_null()
              .default("stable"),
          )
          .col(
            ColumnDef::new(AppUpdates::Mandatory)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(AppUpdates::ReleasedAt).date_time().not_null())
          .col(ColumnDef::new(AppUpdates::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(AppSettings::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AppSettings::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(AppSettings::ProPlanEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AppSettings::MonthlyPrice)
              .integer()
              .not_null()
              .default(999),
          )
          .col(
            ColumnDef::new(AppSettings::YearlyPrice)
              .integer()
              .not_null()
              .default(9999),
          )
          .col(
            ColumnDef::new(AppSettings::TrialDays).integer().not_null().default(5),
          )
          .col(
            ColumnDef::new(AppSettings::PaypalEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AppSettings::StripeEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AppSettings::IntuitEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(AppSettings::PaypalClientId).text().null())
          .col(ColumnDef::new(AppSettings::PaypalClientSecret).text().null())
          .col(
            ColumnDef::new(AppSettings::PaypalMode)
              .string()
              .not_null()
              .default("sandbox"),
          )
          .col(ColumnDef::new(AppSettings::StripePublicKey).text().null())
          .col(ColumnDef::new(AppSettings::StripeSecretKey).text().null())
          .col(ColumnDef::new(AppSettings::IntuitClientId).text().null())
          .col(ColumnDef::new(AppSettings::IntuitClientSecret).text().null())
          .col(ColumnDef::new(AppSettings::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(AppSettings::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(AppSettings::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(AppUpdates::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(FeatureFlags::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum FeatureFlags {
  Table,
  Id,
  FlagKey,
  FlagName,
  Description,
  Enabled,
  RequiresPro,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum AppUpdates {
  Table,
  Id,
  Version,
  Changelog,
  DownloadUrl,
  ReleaseType,
  Mandatory,
  ReleasedAt,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum AppSettings {
  Table,
  Id,
  ProPlanEnabled,
  MonthlyPrice,
  YearlyPrice,
  TrialDays,
  PaypalEnabled,
  StripeEnabled,
  IntuitEnabled,
  PaypalClientId,
  PaypalClientSecret,
  PaypalMode,
  StripePublicKey,
  StripeSecretKey,
  IntuitClientId,
  IntuitClientSecret,
  CreatedAt,
  UpdatedAt,
}
