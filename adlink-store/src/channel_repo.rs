use adlink_core::repository::ChannelRepository;
use adlink_core::{CoreError, CoreResult};
use adlink_shared::{Channel, ChannelStatus, NewChannel, UserId, VerificationUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::map_db_err;
use crate::market_store::SqliteTransaction;

const CHANNEL_COLUMNS: &str = "id, telegram_id, owner_id, title, username, category, subscribers, status, \
                               verification_code, verified_at, created_at";

#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    telegram_id: i64,
    owner_id: i64,
    title: String,
    username: Option<String>,
    category: Option<String>,
    subscribers: Option<i64>,
    status: String,
    verification_code: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChannelRow> for Channel {
    type Error = CoreError;

    fn try_from(row: ChannelRow) -> Result<Self, Self::Error> {
        Ok(Channel {
            id: row.id,
            telegram_id: row.telegram_id,
            owner_id: row.owner_id,
            title: row.title,
            username: row.username,
            category: row.category,
            subscribers: row.subscribers,
            status: row.status.parse()?,
            verification_code: row.verification_code,
            verified_at: row.verified_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ChannelRepository for SqliteTransaction {
    async fn insert_channel(&mut self, owner_id: UserId, channel: &NewChannel) -> CoreResult<Channel> {
        let sql = format!(
            "INSERT INTO channels (telegram_id, owner_id, title, username, category, subscribers, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            CHANNEL_COLUMNS
        );

        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(channel.telegram_id)
            .bind(owner_id)
            .bind(channel.title.trim())
            .bind(channel.username.as_deref().map(|u| u.trim_start_matches('@')))
            .bind(&channel.category)
            .bind(channel.subscribers)
            .bind(ChannelStatus::Pending.as_str())
            .bind(Utc::now())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        row.try_into()
    }

    async fn get_channel(&mut self, id: i64) -> CoreResult<Option<Channel>> {
        let sql = format!("SELECT {} FROM channels WHERE id = ?", CHANNEL_COLUMNS);
        sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .map(Channel::try_from)
            .transpose()
    }

    async fn list_channels_by_owner(&mut self, owner_id: UserId) -> CoreResult<Vec<Channel>> {
        let sql = format!("SELECT {} FROM channels WHERE owner_id = ? ORDER BY id ASC", CHANNEL_COLUMNS);
        let rows = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(owner_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        rows.into_iter().map(Channel::try_from).collect()
    }

    async fn list_channels_by_status(&mut self, status: ChannelStatus) -> CoreResult<Vec<Channel>> {
        let sql = format!("SELECT {} FROM channels WHERE status = ? ORDER BY id ASC", CHANNEL_COLUMNS);
        let rows = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        rows.into_iter().map(Channel::try_from).collect()
    }

    async fn update_channel_verification(
        &mut self,
        id: i64,
        update: &VerificationUpdate,
    ) -> CoreResult<Channel> {
        let sql = format!(
            "UPDATE channels SET status = ?, verification_code = ?, verified_at = ? WHERE id = ? RETURNING {}",
            CHANNEL_COLUMNS
        );
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(update.status.as_str())
            .bind(&update.verification_code)
            .bind(update.verified_at)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| CoreError::not_found("channel", id))?;

        row.try_into()
    }
}
