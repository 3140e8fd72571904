//! SeaORM entity definitions

pub mod app_settings;
pub mod app_update;
pub mod automatic_settings;
pub mod chat_conversation;
pub mod feature_flag;
pub mod license_activation;
pub mod license_key;
pub mod performance_snapshot;
pub mod startup_program;
pub mod subscription;
pub mod system_backup;
pub mod system_scan;
pub mod user;

pub use license_key::LicenseTier;
pub use subscription::{Plan, Status as SubscriptionStatus, Tier};
pub use user::Role;
