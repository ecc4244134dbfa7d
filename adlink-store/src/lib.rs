pub mod app_config;
pub mod database;
pub mod market_store;

mod channel_repo;
mod contract_repo;
mod offer_repo;
mod response_repo;

pub use database::DbClient;
pub use market_store::{SqliteMarketStore, SqliteTransaction};
