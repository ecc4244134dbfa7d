//! Allowed status moves for offers and their responses.
//!
//! ```text
//! offer:     draft ──► active ──► in_progress ──► completed
//!              │          │             │
//!              └──────────┴─────────────┴──────► cancelled
//!
//! response:  pending ──► accepted | rejected
//! ```

use adlink_core::{CoreError, CoreResult};
use adlink_shared::{OfferStatus, ResponseStatus};

pub fn ensure_offer_transition(from: OfferStatus, to: OfferStatus) -> CoreResult<()> {
    use OfferStatus::*;

    let allowed = !from.is_terminal()
        && matches!(
        (from, to),
        (Draft, Active)
            | (Draft, Cancelled)
            | (Active, InProgress)
            | (Active, Cancelled)
            | (InProgress, Completed)
            | (InProgress, Cancelled)
    );

    if allowed {
        Ok(())
    } else {
        Err(CoreError::transition("offer", from, to))
    }
}

pub fn ensure_response_transition(from: ResponseStatus, to: ResponseStatus) -> CoreResult<()> {
    // pending is the only open state; every other status is a final verdict
    if !from.is_terminal() && to.is_terminal() {
        Ok(())
    } else {
        Err(CoreError::transition("response", from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_happy_path() {
        ensure_offer_transition(OfferStatus::Draft, OfferStatus::Active).unwrap();
        ensure_offer_transition(OfferStatus::Active, OfferStatus::InProgress).unwrap();
        ensure_offer_transition(OfferStatus::InProgress, OfferStatus::Completed).unwrap();
    }

    #[test]
    fn test_offer_terminal_states_are_final() {
        for terminal in [OfferStatus::Completed, OfferStatus::Cancelled] {
            for target in OfferStatus::ALL {
                assert!(ensure_offer_transition(terminal, *target).is_err());
            }
        }
    }

    #[test]
    fn test_offer_cannot_skip_to_in_progress_from_draft() {
        let err = ensure_offer_transition(OfferStatus::Draft, OfferStatus::InProgress).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { entity: "offer", .. }));
    }

    #[test]
    fn test_response_cannot_stay_pending() {
        let err = ensure_response_transition(ResponseStatus::Pending, ResponseStatus::Pending).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { entity: "response", .. }));
    }

    #[test]
    fn test_response_only_leaves_pending() {
        ensure_response_transition(ResponseStatus::Pending, ResponseStatus::Accepted).unwrap();
        ensure_response_transition(ResponseStatus::Pending, ResponseStatus::Rejected).unwrap();

        for terminal in [ResponseStatus::Accepted, ResponseStatus::Rejected] {
            for target in ResponseStatus::ALL {
                let err = ensure_response_transition(terminal, *target).unwrap_err();
                assert!(matches!(err, CoreError::InvalidStateTransition { entity: "response", .. }));
            }
        }
    }
}
