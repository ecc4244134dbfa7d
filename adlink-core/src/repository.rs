use adlink_shared::{
    Channel, ChannelStatus, Contract, ContractStatus, NewChannel, NewContract, NewOffer,
    NewResponse, Offer, OfferFilter, OfferResponse, OfferStatus, ResponseStatus, UserId,
    VerificationUpdate,
};
use async_trait::async_trait;

use crate::CoreResult;

/// Lock mode requested when a transaction starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    /// Takes the store's write lock up front so concurrent writers queue
    /// instead of racing on stale reads.
    Write,
}

/// Entry point to persistent storage. Every operation runs inside a
/// transaction obtained here.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn begin(&self, access: Access) -> CoreResult<Box<dyn Transaction>>;
}

/// A unit of work over all marketplace entities. Dropping it without
/// `commit` discards every write.
#[async_trait]
pub trait Transaction:
    UserRepository + OfferRepository + ResponseRepository + ContractRepository + ChannelRepository + Send
{
    async fn commit(self: Box<Self>) -> CoreResult<()>;

    async fn rollback(self: Box<Self>) -> CoreResult<()>;
}

#[async_trait]
pub trait UserRepository: Send {
    /// Registers the user if it is not known yet.
    async fn ensure_user(&mut self, id: UserId) -> CoreResult<()>;
}

#[async_trait]
pub trait OfferRepository: Send {
    async fn insert_offer(
        &mut self,
        created_by: UserId,
        offer: &NewOffer,
        status: OfferStatus,
    ) -> CoreResult<Offer>;

    async fn get_offer(&mut self, id: i64) -> CoreResult<Option<Offer>>;

    /// Newest first.
    async fn list_offers(&mut self, filter: &OfferFilter) -> CoreResult<Vec<Offer>>;

    async fn update_offer_status(&mut self, id: i64, status: OfferStatus) -> CoreResult<Offer>;
}

#[async_trait]
pub trait ResponseRepository: Send {
    async fn insert_response(
        &mut self,
        responder_id: UserId,
        offer_id: i64,
        response: &NewResponse,
    ) -> CoreResult<OfferResponse>;

    async fn get_response(&mut self, id: i64) -> CoreResult<Option<OfferResponse>>;

    /// Oldest first.
    async fn list_responses_for_offer(&mut self, offer_id: i64) -> CoreResult<Vec<OfferResponse>>;

    async fn update_response_status(
        &mut self,
        id: i64,
        status: ResponseStatus,
    ) -> CoreResult<OfferResponse>;
}

#[async_trait]
pub trait ContractRepository: Send {
    async fn insert_contract(&mut self, contract: &NewContract) -> CoreResult<Contract>;

    async fn get_contract(&mut self, id: i64) -> CoreResult<Option<Contract>>;

    async fn find_contract_for_offer(&mut self, offer_id: i64) -> CoreResult<Option<Contract>>;

    /// Contracts where the user is either party, oldest first.
    async fn list_contracts_for_user(&mut self, user_id: UserId) -> CoreResult<Vec<Contract>>;

    async fn update_contract_status(
        &mut self,
        id: i64,
        status: ContractStatus,
    ) -> CoreResult<Contract>;
}

#[async_trait]
pub trait ChannelRepository: Send {
    async fn insert_channel(&mut self, owner_id: UserId, channel: &NewChannel) -> CoreResult<Channel>;

    async fn get_channel(&mut self, id: i64) -> CoreResult<Option<Channel>>;

    async fn list_channels_by_owner(&mut self, owner_id: UserId) -> CoreResult<Vec<Channel>>;

    /// Ordered by channel id ascending.
    async fn list_channels_by_status(&mut self, status: ChannelStatus) -> CoreResult<Vec<Channel>>;

    async fn update_channel_verification(
        &mut self,
        id: i64,
        update: &VerificationUpdate,
    ) -> CoreResult<Channel>;
}

/// Commits on success and rolls back on failure, returning the original
/// result. A failed rollback is logged and the operation error wins.
pub async fn finish<T>(tx: Box<dyn Transaction>, result: CoreResult<T>) -> CoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed after: {}", err);
            }
            Err(err)
        }
    }
}
