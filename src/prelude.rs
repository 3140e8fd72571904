pub use std::time::Duration;

pub use anyhow::Context;
pub use chrono::{NaiveDateTime as DateTime, TimeDelta, Utc};
pub use dashmap::DashMap;
pub use migration::MigratorTrait;
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, Database,
  DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
  QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
pub use tokio::time;
pub use tracing::{debug, error, info, warn};

pub use crate::error::{Error, Result};
pub(crate) use crate::utils;
