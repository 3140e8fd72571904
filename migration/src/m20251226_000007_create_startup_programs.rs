use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// name, publisher, path, impact, startup type, cpu %, ram MB
const SEED: &[(&str, &str, &str, &str, &str, i32, i32)] = &[
  (
    "Discord",
    "Discord Inc.",
    r"C:\Users\User\AppData\Local\Discord\Update.exe",
    "High",
    "Registry",
    12,
    180,
  ),
  (
    "Spotify",
    "Spotify AB",
    r"C:\Users\User\AppData\Roaming\Spotify\Spotify.exe",
    "Medium",
    "Registry",
    6,
    120,
  ),
  (
    "Steam",
    "Valve Corporation",
    r"C:\Program Files (x86)\Steam\steam.exe",
    "High",
    "Registry",
    10,
    220,
  ),
  (
    "OneDrive",
    "Microsoft Corporation",
    r"C:\Program Files\Microsoft OneDrive\OneDrive.exe",
    "Medium",
    "Startup Folder",
    5,
    90,
  ),
  (
    "Windows Security",
    "Microsoft Corporation",
    r"C:\Windows\System32\SecurityHealthSystray.exe",
    "Low",
    "Registry",
    1,
    15,
  ),
  (
    "Adobe Updater",
    "Adobe Inc.",
    r"C:\Program Files (x86)\Common Files\Adobe\ARM\1.0\AdobeARM.exe",
    "Low",
    "Task Scheduler",
    2,
    30,
  ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(StartupPrograms::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(StartupPrograms::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(StartupPrograms::Name).string().not_null())
          .col(ColumnDef::new(StartupPrograms::Publisher).string().not_null())
          .col(ColumnDef::new(StartupPrograms::Path).text().not_null())
          .col(
            ColumnDef::new(StartupPrograms::Enabled)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(StartupPrograms::Impact)
              .string()
              .not_null()
              .default("Low"),
          )
          .col(ColumnDef::new(StartupPrograms::StartupType).string().not_null())
          .col(
            ColumnDef::new(StartupPrograms::CpuImpact)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(StartupPrograms::RamImpact)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(StartupPrograms::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(StartupPrograms::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    let mut insert = Query::insert();
    insert.into_table(StartupPrograms::Table).columns([
      StartupPrograms::Name,
      StartupPrograms::Publisher,
      StartupPrograms::Path,
      StartupPrograms::Impact,
      StartupPrograms::StartupType,
      StartupPrograms::CpuImpact,
      StartupPrograms::RamImpact,
      StartupPrograms::CreatedAt,
      StartupPrograms::UpdatedAt,
    ]);

    for &(name, publisher, path, impact, ty, cpu, ram) in SEED {
      insert.values_panic([
        name.into(),
        publisher.into(),
        path.into(),
        impact.into(),
        ty.into(),
        cpu.into(),
        ram.into(),
        Expr::current_timestamp().into(),
        Expr::current_timestamp().into(),
      ]);
    }

    manager.exec_stmt(insert).await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(StartupPrograms::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum StartupPrograms {
  Table,
  Id,
  Name,
  Publisher,
  Path,
  Enabled,
  Impact,
  StartupType,
  CpuImpact,
  RamImpact,
  CreatedAt,
  UpdatedAt,
}
