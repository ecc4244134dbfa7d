use std::sync::Arc;

use adlink_core::{Access, MarketStore};
use adlink_shared::{Channel, ChannelStatus, Contract, NewChannel, NewOffer, VerificationUpdate};
use adlink_store::app_config::DatabaseConfig;
use adlink_store::DbClient;
use chrono::Utc;
use tempfile::TempDir;

/// Migrated database for service tests.
pub struct TestMarket {
    store: Arc<dyn MarketStore>,
    _dir: Option<TempDir>,
}

impl TestMarket {
    /// Single-connection in-memory database.
    pub async fn new() -> Self {
        let db = DbClient::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        Self { store: Arc::new(db.market_store()), _dir: None }
    }

    /// File database behind a real pool, so concurrent transactions contend
    /// for SQLite's write lock instead of queueing for one connection.
    pub async fn file_backed(max_connections: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("market.db").display()),
            max_connections,
            busy_timeout_ms: 5_000,
        };
        let db = DbClient::new(&config).await.unwrap();
        db.migrate().await.unwrap();
        Self { store: Arc::new(db.market_store()), _dir: Some(dir) }
    }

    pub fn store(&self) -> Arc<dyn MarketStore> {
        self.store.clone()
    }

    pub async fn pending_channel(&self, owner: i64, telegram_id: i64) -> Channel {
        let mut tx = self.store.begin(Access::Write).await.unwrap();
        tx.ensure_user(owner).await.unwrap();
        let channel = tx
            .insert_channel(
                owner,
                &NewChannel {
                    telegram_id,
                    title: format!("channel {}", telegram_id),
                    username: None,
                    category: None,
                    subscribers: None,
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
        channel
    }

    pub async fn verified_channel(&self, owner: i64, telegram_id: i64) -> Channel {
        let channel = self.pending_channel(owner, telegram_id).await;
        let mut tx = self.store.begin(Access::Write).await.unwrap();
        let channel = tx
            .update_channel_verification(
                channel.id,
                &VerificationUpdate {
                    status: ChannelStatus::Verified,
                    verification_code: None,
                    verified_at: Some(Utc::now()),
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
        channel
    }

    pub async fn contract_for_offer(&self, offer_id: i64) -> Option<Contract> {
        let mut tx = self.store.begin(Access::Read).await.unwrap();
        let contract = tx.find_contract_for_offer(offer_id).await.unwrap();
        tx.commit().await.unwrap();
        contract
    }
}

pub fn new_offer(title: &str, publish: bool) -> NewOffer {
    NewOffer {
        title: title.to_string(),
        description: Some("Post about our launch".to_string()),
        category: Some("crypto".to_string()),
        budget: 10_000,
        placement_deadline: None,
        publish,
    }
}
