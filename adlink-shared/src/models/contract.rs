use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
    Cancelled,
}

text_enum!(ContractStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// The binding agreement created when a response is accepted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub id: i64,
    pub offer_id: i64,
    pub response_id: i64,
    pub advertiser_id: UserId,
    pub channel_owner_id: UserId,
    pub price: i64,
    pub status: ContractStatus,
    pub placement_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn is_party(&self, user_id: UserId) -> bool {
        self.advertiser_id == user_id || self.channel_owner_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub offer_id: i64,
    pub response_id: i64,
    pub advertiser_id: UserId,
    pub channel_owner_id: UserId,
    pub price: i64,
    pub placement_deadline: Option<DateTime<Utc>>,
}
