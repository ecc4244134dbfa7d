use adlink_core::{CoreError, CoreResult};
use adlink_shared::{ContractStatus, OfferStatus};

/// Active → Completed | Cancelled. Both targets are terminal.
pub fn ensure_contract_transition(from: ContractStatus, to: ContractStatus) -> CoreResult<()> {
    use ContractStatus::*;

    if matches!((from, to), (Active, Completed) | (Active, Cancelled)) {
        Ok(())
    } else {
        Err(CoreError::transition("contract", from, to))
    }
}

/// Offer status that mirrors a contract status.
pub fn offer_status_for(status: ContractStatus) -> OfferStatus {
    match status {
        ContractStatus::Active => OfferStatus::InProgress,
        ContractStatus::Completed => OfferStatus::Completed,
        ContractStatus::Cancelled => OfferStatus::Cancelled,
    }
}
