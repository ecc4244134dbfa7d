use std::sync::Arc;

use adlink_core::repository::finish;
use adlink_core::{Access, Caller, CoreError, CoreResult, MarketStore, Transaction};
use adlink_shared::{Channel, ChannelStatus, NewChannel, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::verification::{self, VerificationPolicy};

const MAX_TITLE_LEN: usize = 255;

/// Handed to the owner when a verification code is issued.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationTicket {
    pub channel_id: i64,
    pub status: ChannelStatus,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationState {
    pub channel_id: i64,
    pub status: ChannelStatus,
    pub verified_at: Option<DateTime<Utc>>,
    /// Outstanding code, shown to the owner only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct ChannelService {
    store: Arc<dyn MarketStore>,
    policy: VerificationPolicy,
}

impl ChannelService {
    pub fn new(store: Arc<dyn MarketStore>, policy: VerificationPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn register_channel(&self, caller: &Caller, new: NewChannel) -> CoreResult<Channel> {
        validate_new_channel(&new)?;

        let mut tx = self.store.begin(Access::Write).await?;
        let result = insert_channel(tx.as_mut(), caller.user_id, &new).await;
        let channel = finish(tx, result).await?;

        info!(channel_id = channel.id, telegram_id = channel.telegram_id, owner_id = channel.owner_id, "channel registered");
        Ok(channel)
    }

    pub async fn get_channel(&self, id: i64) -> CoreResult<Channel> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = load_channel(tx.as_mut(), id).await;
        finish(tx, result).await
    }

    pub async fn list_channels(&self, owner_id: UserId) -> CoreResult<Vec<Channel>> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = tx.list_channels_by_owner(owner_id).await;
        finish(tx, result).await
    }

    pub async fn verification_state(&self, caller: &Caller, id: i64) -> CoreResult<VerificationState> {
        let channel = self.get_channel(id).await?;
        let code = if channel.owner_id == caller.user_id {
            channel.verification_code.clone()
        } else {
            None
        };

        Ok(VerificationState {
            channel_id: channel.id,
            status: channel.status,
            verified_at: channel.verified_at,
            code,
        })
    }

    /// Transition: Pending → PendingVerification, issuing a new code.
    pub async fn request_verification(&self, caller: &Caller, id: i64) -> CoreResult<VerificationTicket> {
        let code = self.policy.generate_code();

        let mut tx = self.store.begin(Access::Write).await?;
        let result = issue_code(tx.as_mut(), caller, id, code).await;
        let ticket = finish(tx, result).await?;

        info!(channel_id = id, "verification code issued");
        Ok(ticket)
    }

    /// Transition: PendingVerification → Verified when `code` matches.
    pub async fn confirm_verification(&self, caller: &Caller, id: i64, code: &str) -> CoreResult<Channel> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = confirm_code(tx.as_mut(), caller, id, code).await;
        let channel = finish(tx, result).await?;

        info!(channel_id = id, verified_at = ?channel.verified_at, "channel verified");
        Ok(channel)
    }
}

async fn load_channel(tx: &mut dyn Transaction, id: i64) -> CoreResult<Channel> {
    tx.get_channel(id).await?.ok_or_else(|| CoreError::not_found("channel", id))
}

async fn insert_channel(tx: &mut dyn Transaction, owner_id: UserId, new: &NewChannel) -> CoreResult<Channel> {
    tx.ensure_user(owner_id).await?;
    tx.insert_channel(owner_id, new).await
}

async fn issue_code(
    tx: &mut dyn Transaction,
    caller: &Caller,
    id: i64,
    code: String,
) -> CoreResult<VerificationTicket> {
    let channel = load_channel(tx, id).await?;
    caller.ensure_owner(channel.owner_id, "channel")?;

    let update = verification::request(&channel, code)?;
    let channel = tx.update_channel_verification(id, &update).await?;

    let code = channel
        .verification_code
        .ok_or_else(|| CoreError::InternalError(format!("channel {} lost its verification code", id)))?;
    Ok(VerificationTicket { channel_id: channel.id, status: channel.status, code })
}

async fn confirm_code(tx: &mut dyn Transaction, caller: &Caller, id: i64, code: &str) -> CoreResult<Channel> {
    let channel = load_channel(tx, id).await?;
    caller.ensure_owner(channel.owner_id, "channel")?;

    let update = verification::confirm(&channel, code, Utc::now())?;
    tx.update_channel_verification(id, &update).await
}

fn validate_new_channel(new: &NewChannel) -> CoreResult<()> {
    let title = new.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::ValidationError(format!(
            "title must be 1 to {} characters",
            MAX_TITLE_LEN
        )));
    }
    if let Some(subscribers) = new.subscribers {
        if subscribers < 0 {
            return Err(CoreError::ValidationError("subscribers must not be negative".to_string()));
        }
    }
    Ok(())
}
