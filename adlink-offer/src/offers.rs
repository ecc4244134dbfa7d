use std::sync::Arc;

use adlink_core::repository::finish;
use adlink_core::{Access, Caller, CoreError, CoreResult, MarketStore, Transaction};
use adlink_shared::{NewOffer, Offer, OfferFilter, OfferStatus};
use tracing::info;

use crate::lifecycle::ensure_offer_transition;

const MAX_TITLE_LEN: usize = 200;

/// Creates offers and drives the owner-controlled part of their lifecycle.
/// The move to `in_progress` belongs to `ResponseService::accept_response`.
#[derive(Clone)]
pub struct OfferService {
    store: Arc<dyn MarketStore>,
}

impl OfferService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn create_offer(&self, caller: &Caller, new: NewOffer) -> CoreResult<Offer> {
        validate_new_offer(&new)?;
        let status = if new.publish { OfferStatus::Active } else { OfferStatus::Draft };

        let mut tx = self.store.begin(Access::Write).await?;
        let result = insert_offer(tx.as_mut(), caller, &new, status).await;
        let offer = finish(tx, result).await?;

        info!(offer_id = offer.id, created_by = offer.created_by, status = %offer.status, "offer created");
        Ok(offer)
    }

    pub async fn get_offer(&self, id: i64) -> CoreResult<Offer> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = load_offer(tx.as_mut(), id).await;
        finish(tx, result).await
    }

    pub async fn list_offers(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = tx.list_offers(filter).await;
        finish(tx, result).await
    }

    /// Transition: Draft → Active
    pub async fn publish_offer(&self, caller: &Caller, id: i64) -> CoreResult<Offer> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = move_offer(tx.as_mut(), caller, id, OfferStatus::Active).await;
        let offer = finish(tx, result).await?;

        info!(offer_id = offer.id, "offer published");
        Ok(offer)
    }

    /// Cancel an offer that has no contract yet. Offers under contract are
    /// cancelled through the contract.
    pub async fn cancel_offer(&self, caller: &Caller, id: i64) -> CoreResult<Offer> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = move_offer(tx.as_mut(), caller, id, OfferStatus::Cancelled).await;
        let offer = finish(tx, result).await?;

        info!(offer_id = offer.id, "offer cancelled");
        Ok(offer)
    }
}

/// Fetch an offer or fail with `NotFound`.
pub async fn load_offer(tx: &mut dyn Transaction, id: i64) -> CoreResult<Offer> {
    tx.get_offer(id).await?.ok_or_else(|| CoreError::not_found("offer", id))
}

async fn insert_offer(
    tx: &mut dyn Transaction,
    caller: &Caller,
    new: &NewOffer,
    status: OfferStatus,
) -> CoreResult<Offer> {
    tx.ensure_user(caller.user_id).await?;
    tx.insert_offer(caller.user_id, new, status).await
}

async fn move_offer(
    tx: &mut dyn Transaction,
    caller: &Caller,
    id: i64,
    to: OfferStatus,
) -> CoreResult<Offer> {
    let offer = load_offer(tx, id).await?;
    caller.ensure_owner(offer.created_by, "offer")?;

    if offer.status == OfferStatus::InProgress && to == OfferStatus::Cancelled {
        return Err(CoreError::Conflict(format!(
            "offer {} is under contract; cancel the contract instead",
            id
        )));
    }
    ensure_offer_transition(offer.status, to)?;

    tx.update_offer_status(id, to).await
}

fn validate_new_offer(new: &NewOffer) -> CoreResult<()> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(CoreError::ValidationError("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::ValidationError(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    if new.budget <= 0 {
        return Err(CoreError::ValidationError("budget must be positive".to_string()));
    }
    Ok(())
}
