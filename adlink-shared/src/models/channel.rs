use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Verification state of a channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Pending,
    PendingVerification,
    Verified,
}

text_enum!(ChannelStatus {
    Pending => "pending",
    PendingVerification => "pending_verification",
    Verified => "verified",
});

/// A Telegram channel registered by its owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub id: i64,
    pub telegram_id: i64,
    pub owner_id: UserId,
    pub title: String,
    pub username: Option<String>,
    pub category: Option<String>,
    pub subscribers: Option<i64>,
    pub status: ChannelStatus,
    /// Only handed to the owner when verification is requested
    #[serde(skip_serializing, default)]
    pub verification_code: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn is_verified(&self) -> bool {
        self.status == ChannelStatus::Verified
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChannel {
    pub telegram_id: i64,
    pub title: String,
    pub username: Option<String>,
    pub category: Option<String>,
    pub subscribers: Option<i64>,
}

/// Columns written together on every verification step
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationUpdate {
    pub status: ChannelStatus,
    pub verification_code: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_code_not_serialized() {
        let channel = Channel {
            id: 1,
            telegram_id: -100123,
            owner_id: 7,
            title: "Daily Rust".to_string(),
            username: None,
            category: None,
            subscribers: Some(1200),
            status: ChannelStatus::PendingVerification,
            verification_code: Some("AB12CD34".to_string()),
            verified_at: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&channel).unwrap();
        assert!(json.get("verification_code").is_none());
        assert_eq!(json["status"], "pending_verification");
    }
}
