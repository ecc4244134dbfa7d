use std::sync::Arc;

use adlink_core::repository::finish;
use adlink_core::{Access, Caller, CoreError, CoreResult, MarketStore, Transaction};
use adlink_offer::ensure_offer_transition;
use adlink_shared::{Contract, ContractStatus};
use tracing::info;

use crate::lifecycle::{ensure_contract_transition, offer_status_for};

/// Manages contract lifecycle after creation. Every contract move is
/// mirrored onto the parent offer in the same transaction.
#[derive(Clone)]
pub struct ContractService {
    store: Arc<dyn MarketStore>,
}

impl ContractService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Visible to the advertiser and the channel owner.
    pub async fn get_contract(&self, caller: &Caller, id: i64) -> CoreResult<Contract> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = party_contract(tx.as_mut(), caller, id).await;
        finish(tx, result).await
    }

    pub async fn list_contracts(&self, caller: &Caller) -> CoreResult<Vec<Contract>> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = tx.list_contracts_for_user(caller.user_id).await;
        finish(tx, result).await
    }

    /// Transition: Active → Completed (advertiser confirms the placement)
    pub async fn complete_contract(&self, caller: &Caller, id: i64) -> CoreResult<Contract> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = complete(tx.as_mut(), caller, id).await;
        let contract = finish(tx, result).await?;

        info!(contract_id = id, offer_id = contract.offer_id, "contract completed");
        Ok(contract)
    }

    /// Transition: Active → Cancelled (either party)
    pub async fn cancel_contract(&self, caller: &Caller, id: i64) -> CoreResult<Contract> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = cancel(tx.as_mut(), caller, id).await;
        let contract = finish(tx, result).await?;

        info!(contract_id = id, offer_id = contract.offer_id, cancelled_by = caller.user_id, "contract cancelled");
        Ok(contract)
    }
}

async fn party_contract(tx: &mut dyn Transaction, caller: &Caller, id: i64) -> CoreResult<Contract> {
    let contract = tx
        .get_contract(id)
        .await?
        .ok_or_else(|| CoreError::not_found("contract", id))?;

    if !contract.is_party(caller.user_id) {
        return Err(CoreError::Forbidden(format!("not a party to contract {}", id)));
    }
    Ok(contract)
}

async fn complete(tx: &mut dyn Transaction, caller: &Caller, id: i64) -> CoreResult<Contract> {
    let contract = party_contract(tx, caller, id).await?;
    caller.ensure_owner(contract.advertiser_id, "contract")?;
    transition(tx, contract, ContractStatus::Completed).await
}

async fn cancel(tx: &mut dyn Transaction, caller: &Caller, id: i64) -> CoreResult<Contract> {
    let contract = party_contract(tx, caller, id).await?;
    transition(tx, contract, ContractStatus::Cancelled).await
}

async fn transition(tx: &mut dyn Transaction, contract: Contract, to: ContractStatus) -> CoreResult<Contract> {
    ensure_contract_transition(contract.status, to)?;

    let offer = tx
        .get_offer(contract.offer_id)
        .await?
        .ok_or_else(|| CoreError::not_found("offer", contract.offer_id))?;
    let offer_to = offer_status_for(to);
    ensure_offer_transition(offer.status, offer_to)?;

    let updated = tx.update_contract_status(contract.id, to).await?;
    tx.update_offer_status(offer.id, offer_to).await?;
    Ok(updated)
}
