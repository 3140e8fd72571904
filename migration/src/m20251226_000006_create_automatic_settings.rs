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
          .table(AutomaticSettings::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AutomaticSettings::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(AutomaticSettings::UserId)
              .integer()
              .not_null()
              .unique_key(),
          )
          .col(
            ColumnDef::new(AutomaticSettings::ScheduleEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AutomaticSettings::ScheduleFrequency)
              .string()
              .not_null()
              .default("weekly"),
          )
          .col(
            ColumnDef::new(AutomaticSettings::OptimizeOnStartup)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AutomaticSettings::LowDiskSpaceEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AutomaticSettings::DiskSpaceThreshold)
              .integer()
              .not_null()
              .default(10),
          )
          .col(
            ColumnDef::new(AutomaticSettings::AutoBackup)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(AutomaticSettings::OptimizationProfile)
              .string()
              .not_null()
              .default("balanced"),
          )
          .col(
            ColumnDef::new(AutomaticSettings::CreatedAt).date_time().not_null(),
          )
          .col(
            ColumnDef::new(AutomaticSettings::UpdatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_automatic_settings_user")
              .from(AutomaticSettings::Table, AutomaticSettings::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(AutomaticSettings::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum AutomaticSettings {
  Table,
  Id,
  UserId,
  ScheduleEnabled,
  ScheduleFrequency,
  OptimizeOnStartup,
  LowDiskSpaceEnabled,
  DiskSpaceThreshold,
  AutoBackup,
  OptimizationProfile,
  CreatedAt,
  UpdatedAt,
}
