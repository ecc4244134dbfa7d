use std::str::FromStr;
use std::time::Duration;

use adlink_core::CoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::market_store::SqliteMarketStore;

#[derive(Clone)]
pub struct DbClient {
    pub pool: SqlitePool,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. A single connection is kept open for the
    /// pool's lifetime, since the data lives and dies with it.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    pub fn market_store(&self) -> SqliteMarketStore {
        SqliteMarketStore::new(self.pool.clone())
    }
}

/// Translate a driver error into the domain taxonomy. Constraint
/// violations become client errors, everything else is internal.
pub(crate) fn map_db_err(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CoreError::Conflict(conflict_message(db.message()).to_string());
        }
        if db.is_foreign_key_violation() {
            return CoreError::ValidationError("referenced record does not exist".to_string());
        }
        if db.is_check_violation() {
            return CoreError::ValidationError(format!("constraint violated: {}", db.message()));
        }
        let code = db.code().and_then(|c| c.parse::<i32>().ok());
        // SQLITE_CONSTRAINT_TRIGGER, raised by the integrity triggers
        if code == Some(SQLITE_CONSTRAINT_TRIGGER) {
            return CoreError::Conflict(db.message().to_string());
        }
        // Another writer held the lock for the whole busy timeout
        if code.is_some_and(is_lock_contention) {
            return CoreError::Conflict("another write is in progress, retry".to_string());
        }
    }
    CoreError::InternalError(err.to_string())
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT_TRIGGER: i32 = 1811;

/// Primary code lives in the low byte of an extended result code.
fn is_lock_contention(code: i32) -> bool {
    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
}

fn conflict_message(message: &str) -> &'static str {
    if message.contains("contracts.") {
        "offer already has a contract"
    } else if message.contains("offer_responses.channel_id") {
        "channel already responded to this offer"
    } else if message.contains("offer_responses.offer_id") {
        "offer already has an accepted response"
    } else if message.contains("channels.telegram_id") {
        "channel is already registered"
    } else {
        "record already exists"
    }
}
