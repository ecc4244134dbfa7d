use adlink_core::repository::UserRepository;
use adlink_core::{Access, CoreResult, MarketStore, Transaction};
use adlink_shared::UserId;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::database::map_db_err;

/// SQLite-backed [`MarketStore`].
#[derive(Clone)]
pub struct SqliteMarketStore {
    pool: SqlitePool,
}

impl SqliteMarketStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for SqliteMarketStore {
    async fn begin(&self, access: Access) -> CoreResult<Box<dyn Transaction>> {
        let tx = match access {
            Access::Read => self.pool.begin().await,
            // Take the write lock now rather than upgrading on first write,
            // so the reads that guard a write never see stale rows.
            Access::Write => self.pool.begin_with("BEGIN IMMEDIATE").await,
        }
        .map_err(map_db_err)?;

        Ok(Box::new(SqliteTransaction { tx }))
    }
}

pub struct SqliteTransaction {
    pub(crate) tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let SqliteTransaction { tx } = *self;
        tx.commit().await.map_err(map_db_err)
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        let SqliteTransaction { tx } = *self;
        tx.rollback().await.map_err(map_db_err)
    }
}

#[async_trait]
impl UserRepository for SqliteTransaction {
    async fn ensure_user(&mut self, id: UserId) -> CoreResult<()> {
        sqlx::query("INSERT INTO users (id, created_at) VALUES (?, ?) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
