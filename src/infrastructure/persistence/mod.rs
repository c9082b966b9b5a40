//! Persistence implementations

pub mod memory;

#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod call_record_repository;
#[cfg(feature = "postgres")]
pub mod campaign_repository;

#[cfg(feature = "postgres")]
pub use database::{create_pool, run_migrations, DatabaseConfig};
#[cfg(feature = "postgres")]
pub use call_record_repository::PgCallRecordRepository;
#[cfg(feature = "postgres")]
pub use campaign_repository::PgCampaignRepository;
