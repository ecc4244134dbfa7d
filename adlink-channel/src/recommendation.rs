use std::sync::Arc;

use adlink_core::repository::finish;
use adlink_core::{Access, CoreError, CoreResult, MarketStore, Transaction};
use adlink_shared::{Channel, ChannelStatus, Offer};
use serde::Serialize;

use crate::ranking::{by_score_desc, ChannelRanker, StableRanker};

/// A channel suggested for an offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Verified channels the offer's creator does not own, by channel id.
pub fn eligible_channels(offer: &Offer, channels: Vec<Channel>) -> Vec<Channel> {
    let mut eligible: Vec<Channel> = channels
        .into_iter()
        .filter(|c| c.status == ChannelStatus::Verified && c.owner_id != offer.created_by)
        .collect();
    eligible.sort_by_key(|c| c.id);
    eligible
}

/// Score and order candidates. The sort is stable, so equal or missing
/// scores keep id order.
pub fn rank(ranker: &dyn ChannelRanker, offer: &Offer, channels: Vec<Channel>) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = channels
        .into_iter()
        .map(|channel| Recommendation {
            score: ranker.score(offer, &channel).filter(|s| !s.is_nan()),
            channel,
        })
        .collect();
    ranked.sort_by(|a, b| by_score_desc(a.score, b.score));
    ranked
}

/// Read-only query: which channels could carry this offer.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn MarketStore>,
    ranker: Arc<dyn ChannelRanker>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self::with_ranker(store, Arc::new(StableRanker))
    }

    pub fn with_ranker(store: Arc<dyn MarketStore>, ranker: Arc<dyn ChannelRanker>) -> Self {
        Self { store, ranker }
    }

    pub async fn recommend(&self, offer_id: i64) -> CoreResult<Vec<Recommendation>> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = candidates(tx.as_mut(), offer_id).await;
        let (offer, channels) = finish(tx, result).await?;

        let eligible = eligible_channels(&offer, channels);
        tracing::debug!(offer_id, count = eligible.len(), "channels recommended");
        Ok(rank(self.ranker.as_ref(), &offer, eligible))
    }
}

async fn candidates(tx: &mut dyn Transaction, offer_id: i64) -> CoreResult<(Offer, Vec<Channel>)> {
    let offer = tx
        .get_offer(offer_id)
        .await?
        .ok_or_else(|| CoreError::not_found("offer", offer_id))?;
    let channels = tx.list_channels_by_status(ChannelStatus::Verified).await?;
    Ok((offer, channels))
}
