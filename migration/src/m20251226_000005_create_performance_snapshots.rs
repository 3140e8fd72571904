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
          .table(PerformanceSnapshots::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PerformanceSnapshots::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(PerformanceSnapshots::UserId).integer().not_null())
          .col(
            ColumnDef::new(PerformanceSnapshots::SnapshotType)
              .string()
              .not_null(),
          )
          .col(ColumnDef::new(PerformanceSnapshots::FixType).string().null())
          .col(
            ColumnDef::new(PerformanceSnapshots::BootTimeSeconds).integer().null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::CpuUsagePercent).integer().null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::MemoryUsagePercent)
              .integer()
              .null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::DiskUsagePercent).integer().null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::StartupProgramsCount)
              .integer()
              .null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::OutdatedDriversCount)
              .integer()
              .null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::SecurityIssuesCount)
              .integer()
              .null(),
          )
          .col(
            ColumnDef::new(PerformanceSnapshots::CreatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_performance_snapshots_user")
              .from(PerformanceSnapshots::Table, PerformanceSnapshots::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_performance_snapshots_user")
          .table(PerformanceSnapshots::Table)
          .col(PerformanceSnapshots::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(PerformanceSnapshots::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum PerformanceSnapshots {
  Table,
  Id,
  UserId,
  SnapshotType,
  FixType,
  BootTimeSeconds,
  CpuUsagePercent,
  MemoryUsagePercent,
  DiskUsagePercent,
  StartupProgramsCount,
  OutdatedDriversCount,
  SecurityIssuesCount,
  CreatedAt,
}
