//! Channel verification state machine.
//!
//! `pending → pending_verification → verified`. Requesting verification again
//! while a code is outstanding replaces the code. `verified` is final; a way
//! back would be added to [`ensure_verification_transition`].

use adlink_core::{CoreError, CoreResult};
use adlink_shared::{Channel, ChannelStatus, VerificationUpdate};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;

/// Tunables for issued verification codes. The length is checked when the
/// configuration is loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationPolicy {
    pub code_length: usize,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self { code_length: 8 }
    }
}

impl VerificationPolicy {
    pub fn generate_code(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.code_length)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect()
    }
}

pub fn ensure_verification_transition(from: ChannelStatus, to: ChannelStatus) -> CoreResult<()> {
    use ChannelStatus::*;

    let allowed = matches!(
        (from, to),
        (Pending, PendingVerification)
            | (PendingVerification, PendingVerification)
            | (PendingVerification, Verified)
    );

    if allowed {
        Ok(())
    } else {
        Err(CoreError::transition("channel", from, to))
    }
}

/// Issue a fresh code and move the channel into `pending_verification`.
pub fn request(channel: &Channel, code: String) -> CoreResult<VerificationUpdate> {
    ensure_verification_transition(channel.status, ChannelStatus::PendingVerification)?;

    Ok(VerificationUpdate {
        status: ChannelStatus::PendingVerification,
        verification_code: Some(code),
        verified_at: None,
    })
}

/// Confirm the code the owner presented. A mismatch leaves the channel as it is.
pub fn confirm(channel: &Channel, presented: &str, now: DateTime<Utc>) -> CoreResult<VerificationUpdate> {
    ensure_verification_transition(channel.status, ChannelStatus::Verified)?;

    let expected = channel
        .verification_code
        .as_deref()
        .ok_or_else(|| CoreError::InternalError(format!("channel {} has no verification code", channel.id)))?;

    if !expected.eq_ignore_ascii_case(presented.trim()) {
        return Err(CoreError::ValidationError("verification code does not match".to_string()));
    }

    Ok(VerificationUpdate {
        status: ChannelStatus::Verified,
        verification_code: None,
        verified_at: Some(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(status: ChannelStatus, code: Option<&str>) -> Channel {
        Channel {
            id: 3,
            telegram_id: -100_777,
            owner_id: 9,
            title: "Rust daily".to_string(),
            username: Some("rustdaily".to_string()),
            category: None,
            subscribers: None,
            status,
            verification_code: code.map(str::to_string),
            verified_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generated_code_shape() {
        let policy = VerificationPolicy { code_length: 10 };
        let code = policy.generate_code();
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_request_from_pending() {
        let update = request(&channel(ChannelStatus::Pending, None), "ABCD1234".to_string()).unwrap();
        assert_eq!(update.status, ChannelStatus::PendingVerification);
        assert_eq!(update.verification_code.as_deref(), Some("ABCD1234"));
        assert!(update.verified_at.is_none());
    }

    #[test]
    fn test_request_again_replaces_code() {
        let current = channel(ChannelStatus::PendingVerification, Some("OLD00000"));
        let update = request(&current, "NEW11111".to_string()).unwrap();
        assert_eq!(update.verification_code.as_deref(), Some("NEW11111"));
    }

    #[test]
    fn test_verified_is_final() {
        let verified = channel(ChannelStatus::Verified, None);
        let err = request(&verified, "X".to_string()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { entity: "channel", .. }));

        let err = confirm(&verified, "X", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_confirm_sets_verified_at() {
        let now = Utc::now();
        let update = confirm(&channel(ChannelStatus::PendingVerification, Some("ABCD1234")), " abcd1234 ", now).unwrap();
        assert_eq!(update.status, ChannelStatus::Verified);
        assert_eq!(update.verified_at, Some(now));
        assert!(update.verification_code.is_none());
    }

    #[test]
    fn test_confirm_wrong_code() {
        let err = confirm(&channel(ChannelStatus::PendingVerification, Some("ABCD1234")), "nope", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_confirm_requires_request_first() {
        let err = confirm(&channel(ChannelStatus::Pending, None), "ABCD1234", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }
}
