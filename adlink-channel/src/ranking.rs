use std::cmp::Ordering;

use adlink_shared::{Channel, Offer};

/// Scores a candidate channel for an offer. Higher scores rank first;
/// `None` means "no opinion" and keeps the candidate in id order behind
/// every scored one. A NaN score is treated as `None`.
pub trait ChannelRanker: Send + Sync {
    fn score(&self, offer: &Offer, channel: &Channel) -> Option<f64>;
}

/// Leaves candidates unscored, so results stay in channel id order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableRanker;

impl ChannelRanker for StableRanker {
    fn score(&self, _offer: &Offer, _channel: &Channel) -> Option<f64> {
        None
    }
}

/// Descending by score, unscored last. Used with a stable sort.
pub(crate) fn by_score_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
