use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Pending,
    Accepted,
    Rejected,
}

text_enum!(ResponseStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

impl ResponseStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResponseStatus::Pending)
    }
}

/// A channel owner's reply to an offer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferResponse {
    pub id: i64,
    pub offer_id: i64,
    pub channel_id: i64,
    pub responder_id: UserId,
    pub message: Option<String>,
    pub proposed_price: Option<i64>,
    pub status: ResponseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResponse {
    pub channel_id: i64,
    pub message: Option<String>,
    pub proposed_price: Option<i64>,
}
