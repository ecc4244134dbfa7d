use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Offer status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Draft,
    Active,
    InProgress,
    Completed,
    Cancelled,
}

text_enum!(OfferStatus {
    Draft => "draft",
    Active => "active",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl OfferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OfferStatus::Completed | OfferStatus::Cancelled)
    }
}

/// An advertising placement request created by an advertiser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Budget in the smallest currency unit
    pub budget: i64,
    pub placement_deadline: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.created_by == user_id
    }

    pub fn accepts_responses(&self) -> bool {
        self.status == OfferStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOffer {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub budget: i64,
    pub placement_deadline: Option<DateTime<Utc>>,
    /// Create the offer directly as `active` instead of `draft`
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferFilter {
    pub status: Option<OfferStatus>,
    pub category: Option<String>,
    pub created_by: Option<UserId>,
}
