use crate::{entity::startup_program, prelude::*};

pub struct Startup<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Startup<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn all(&self) -> Result<Vec<startup_program::Model>> {
    let programs = startup_program::Entity::find()
      .order_by_asc(startup_program::Column::Id)
      .all(self.db)
      .await?;
    Ok(programs)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<startup_program::Model>> {
    Ok(startup_program::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn toggle(&self, id: i32, enabled: bool) -> Result<()> {
    let res = startup_program::Entity::update_many()
      .col_expr(startup_program::Column::Enabled, Expr::value(enabled))
      .col_expr(
        startup_program::Column::UpdatedAt,
        Expr::value(Utc::now().naive_utc()),
      )
      .filter(startup_program::Column::Id.eq(id))
      .exec(self.db)
      .await?;

    if res.rows_affected == 0 {
      return Err(Error::NotFound("Startup program not found"));
    }
    Ok(())
  }
}
