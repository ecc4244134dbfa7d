use std::sync::Arc;

use adlink_core::repository::finish;
use adlink_core::{Access, Caller, CoreError, CoreResult, MarketStore, Transaction};
use adlink_shared::{
    ChannelStatus, Contract, NewContract, NewResponse, OfferResponse, OfferStatus, ResponseStatus,
};
use tracing::info;

use crate::lifecycle::{ensure_offer_transition, ensure_response_transition};
use crate::offers::load_offer;

const MAX_MESSAGE_LEN: usize = 2000;

/// Response state machine. Accepting a response is the only way a contract
/// comes into existence.
#[derive(Clone)]
pub struct ResponseService {
    store: Arc<dyn MarketStore>,
}

impl ResponseService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// A channel owner responds to an active offer with one of their verified channels.
    pub async fn create_response(
        &self,
        caller: &Caller,
        offer_id: i64,
        new: NewResponse,
    ) -> CoreResult<OfferResponse> {
        validate_new_response(&new)?;

        let mut tx = self.store.begin(Access::Write).await?;
        let result = insert_response(tx.as_mut(), caller, offer_id, &new).await;
        let response = finish(tx, result).await?;

        info!(
            response_id = response.id,
            offer_id,
            channel_id = response.channel_id,
            "response created"
        );
        Ok(response)
    }

    pub async fn get_response(&self, caller: &Caller, id: i64) -> CoreResult<OfferResponse> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = visible_response(tx.as_mut(), caller, id).await;
        finish(tx, result).await
    }

    /// Responses to an offer, visible to the offer owner only.
    pub async fn list_responses(&self, caller: &Caller, offer_id: i64) -> CoreResult<Vec<OfferResponse>> {
        let mut tx = self.store.begin(Access::Read).await?;
        let result = owner_responses(tx.as_mut(), caller, offer_id).await;
        finish(tx, result).await
    }

    /// Transition: Pending → Accepted.
    ///
    /// Creates the offer's contract and moves the offer to `in_progress` in
    /// the same transaction. Fails with `Conflict` when the offer already has
    /// a contract, including when a concurrent accept won the race.
    pub async fn accept_response(&self, caller: &Caller, response_id: i64) -> CoreResult<Contract> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = accept(tx.as_mut(), caller, response_id).await;
        let contract = finish(tx, result).await?;

        info!(
            contract_id = contract.id,
            offer_id = contract.offer_id,
            response_id,
            price = contract.price,
            "response accepted, contract created"
        );
        Ok(contract)
    }

    /// Transition: Pending → Rejected. Touches nothing but the response.
    pub async fn reject_response(&self, caller: &Caller, response_id: i64) -> CoreResult<OfferResponse> {
        let mut tx = self.store.begin(Access::Write).await?;
        let result = reject(tx.as_mut(), caller, response_id).await;
        let response = finish(tx, result).await?;

        info!(response_id, offer_id = response.offer_id, "response rejected");
        Ok(response)
    }
}

async fn load_response(tx: &mut dyn Transaction, id: i64) -> CoreResult<OfferResponse> {
    tx.get_response(id).await?.ok_or_else(|| CoreError::not_found("response", id))
}

async fn insert_response(
    tx: &mut dyn Transaction,
    caller: &Caller,
    offer_id: i64,
    new: &NewResponse,
) -> CoreResult<OfferResponse> {
    let offer = load_offer(tx, offer_id).await?;
    if offer.is_owned_by(caller.user_id) {
        return Err(CoreError::Forbidden("cannot respond to your own offer".to_string()));
    }
    if !offer.accepts_responses() {
        return Err(CoreError::Conflict(format!(
            "offer {} is {} and does not accept responses",
            offer.id, offer.status
        )));
    }

    let channel = tx
        .get_channel(new.channel_id)
        .await?
        .ok_or_else(|| CoreError::not_found("channel", new.channel_id))?;
    caller.ensure_owner(channel.owner_id, "channel")?;
    if channel.status != ChannelStatus::Verified {
        return Err(CoreError::ValidationError(format!(
            "channel {} is not verified",
            channel.id
        )));
    }

    tx.insert_response(caller.user_id, offer_id, new).await
}

async fn visible_response(tx: &mut dyn Transaction, caller: &Caller, id: i64) -> CoreResult<OfferResponse> {
    let response = load_response(tx, id).await?;
    if response.responder_id == caller.user_id {
        return Ok(response);
    }

    let offer = load_offer(tx, response.offer_id).await?;
    caller.ensure_owner(offer.created_by, "response")?;
    Ok(response)
}

async fn owner_responses(
    tx: &mut dyn Transaction,
    caller: &Caller,
    offer_id: i64,
) -> CoreResult<Vec<OfferResponse>> {
    let offer = load_offer(tx, offer_id).await?;
    caller.ensure_owner(offer.created_by, "offer")?;
    tx.list_responses_for_offer(offer_id).await
}

async fn accept(tx: &mut dyn Transaction, caller: &Caller, response_id: i64) -> CoreResult<Contract> {
    let response = load_response(tx, response_id).await?;
    let offer = load_offer(tx, response.offer_id).await?;
    caller.ensure_owner(offer.created_by, "offer")?;

    // The contract check comes before the status checks so that the loser
    // of two concurrent accepts always sees Conflict.
    if let Some(existing) = tx.find_contract_for_offer(offer.id).await? {
        return Err(CoreError::Conflict(format!(
            "offer {} already has contract {}",
            offer.id, existing.id
        )));
    }
    ensure_response_transition(response.status, ResponseStatus::Accepted)?;
    ensure_offer_transition(offer.status, OfferStatus::InProgress)?;

    let channel = tx
        .get_channel(response.channel_id)
        .await?
        .ok_or_else(|| CoreError::not_found("channel", response.channel_id))?;

    let accepted = tx.update_response_status(response.id, ResponseStatus::Accepted).await?;
    let contract = tx
        .insert_contract(&NewContract {
            offer_id: offer.id,
            response_id: accepted.id,
            advertiser_id: offer.created_by,
            channel_owner_id: channel.owner_id,
            price: accepted.proposed_price.unwrap_or(offer.budget),
            placement_deadline: offer.placement_deadline,
        })
        .await?;
    tx.update_offer_status(offer.id, OfferStatus::InProgress).await?;

    Ok(contract)
}

async fn reject(tx: &mut dyn Transaction, caller: &Caller, response_id: i64) -> CoreResult<OfferResponse> {
    let response = load_response(tx, response_id).await?;
    let offer = load_offer(tx, response.offer_id).await?;
    caller.ensure_owner(offer.created_by, "offer")?;
    ensure_response_transition(response.status, ResponseStatus::Rejected)?;

    tx.update_response_status(response.id, ResponseStatus::Rejected).await
}

fn validate_new_response(new: &NewResponse) -> CoreResult<()> {
    if let Some(price) = new.proposed_price {
        if price <= 0 {
            return Err(CoreError::ValidationError("proposed_price must be positive".to_string()));
        }
    }
    if let Some(message) = &new.message {
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(CoreError::ValidationError(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_offer, TestMarket};
    use crate::OfferService;

    struct Fixture {
        market: TestMarket,
        offers: OfferService,
        responses: ResponseService,
    }

    const ADVERTISER: i64 = 100;
    const OWNER_A: i64 = 200;
    const OWNER_B: i64 = 300;

    impl Fixture {
        async fn new() -> Self {
            let market = TestMarket::new().await;
            Self {
                offers: OfferService::new(market.store()),
                responses: ResponseService::new(market.store()),
                market,
            }
        }

        async fn active_offer(&self) -> i64 {
            self.offers
                .create_offer(&Caller::new(ADVERTISER), new_offer("Crypto promo", true))
                .await
                .unwrap()
                .id
        }

        async fn respond(&self, offer_id: i64, owner: i64, telegram_id: i64, price: Option<i64>) -> OfferResponse {
            let channel = self.market.verified_channel(owner, telegram_id).await;
            self.responses
                .create_response(
                    &Caller::new(owner),
                    offer_id,
                    NewResponse { channel_id: channel.id, message: Some("hi".to_string()), proposed_price: price },
                )
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_accept_creates_single_contract() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, Some(5_000)).await;

        let contract = fx.responses.accept_response(&Caller::new(ADVERTISER), response.id).await.unwrap();

        assert_eq!(contract.offer_id, offer_id);
        assert_eq!(contract.response_id, response.id);
        assert_eq!(contract.advertiser_id, ADVERTISER);
        assert_eq!(contract.channel_owner_id, OWNER_A);
        assert_eq!(contract.price, 5_000);

        let offer = fx.offers.get_offer(offer_id).await.unwrap();
        assert_eq!(offer.status, OfferStatus::InProgress);

        let stored = fx.responses.get_response(&Caller::new(OWNER_A), response.id).await.unwrap();
        assert_eq!(stored.status, ResponseStatus::Accepted);
    }

    #[tokio::test]
    async fn test_contract_price_falls_back_to_budget() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, None).await;

        let contract = fx.responses.accept_response(&Caller::new(ADVERTISER), response.id).await.unwrap();
        assert_eq!(contract.price, new_offer("x", true).budget);
    }

    #[tokio::test]
    async fn test_second_accept_on_same_offer_conflicts() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let first = fx.respond(offer_id, OWNER_A, -1001, None).await;
        let second = fx.respond(offer_id, OWNER_B, -1002, None).await;

        fx.responses.accept_response(&Caller::new(ADVERTISER), first.id).await.unwrap();
        let err = fx.responses.accept_response(&Caller::new(ADVERTISER), second.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let responses = fx.responses.list_responses(&Caller::new(ADVERTISER), offer_id).await.unwrap();
        let accepted = responses.iter().filter(|r| r.status == ResponseStatus::Accepted).count();
        assert_eq!(accepted, 1);
        assert_eq!(responses[1].status, ResponseStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_yield_one_contract() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let first = fx.respond(offer_id, OWNER_A, -1001, None).await;
        let second = fx.respond(offer_id, OWNER_B, -1002, None).await;

        let caller = Caller::new(ADVERTISER);
        let (a, b) = tokio::join!(
            fx.responses.accept_response(&caller, first.id),
            fx.responses.accept_response(&caller, second.id),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(CoreError::Conflict(_)))));

        let contract = fx.market.contract_for_offer(offer_id).await.unwrap();
        let winner = outcomes.iter().find_map(|r| r.as_ref().ok()).unwrap();
        assert_eq!(contract.id, winner.id);
    }

    #[tokio::test]
    async fn test_same_response_accepted_twice_concurrently() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, None).await;

        let caller = Caller::new(ADVERTISER);
        let (a, b) = tokio::join!(
            fx.responses.accept_response(&caller, response.id),
            fx.responses.accept_response(&caller, response.id),
        );

        assert!(a.is_ok() ^ b.is_ok());
        let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    async fn spawn_accepts(responses: &ResponseService, ids: Vec<i64>) -> (usize, usize) {
        let caller = Caller::new(ADVERTISER);
        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let responses = responses.clone();
                tokio::spawn(async move { responses.accept_response(&caller, id).await })
            })
            .collect();

        let (mut accepted, mut conflicts) = (0, 0);
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(CoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected accept error: {}", other),
            }
        }
        (accepted, conflicts)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pooled_accepts_race_to_one_contract() {
        const BIDDERS: i64 = 6;
        let market = TestMarket::file_backed(8).await;
        let offers = OfferService::new(market.store());
        let responses = ResponseService::new(market.store());

        for round in 0..3 {
            let offer_id = offers
                .create_offer(&Caller::new(ADVERTISER), new_offer("Crypto promo", true))
                .await
                .unwrap()
                .id;

            let mut ids = Vec::new();
            for i in 0..BIDDERS {
                let owner = OWNER_A + i;
                let channel = market.verified_channel(owner, -10_000 * (round + 1) - i).await;
                let response = responses
                    .create_response(
                        &Caller::new(owner),
                        offer_id,
                        NewResponse { channel_id: channel.id, message: None, proposed_price: None },
                    )
                    .await
                    .unwrap();
                ids.push(response.id);
            }

            let (accepted, conflicts) = spawn_accepts(&responses, ids).await;
            assert_eq!(accepted, 1);
            assert_eq!(conflicts, BIDDERS as usize - 1);

            let listed = responses.list_responses(&Caller::new(ADVERTISER), offer_id).await.unwrap();
            assert_eq!(listed.iter().filter(|r| r.status == ResponseStatus::Accepted).count(), 1);
            let offer = offers.get_offer(offer_id).await.unwrap();
            assert_eq!(offer.status, OfferStatus::InProgress);
            assert!(market.contract_for_offer(offer_id).await.is_some());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pooled_accepts_of_one_response() {
        let market = TestMarket::file_backed(8).await;
        let offers = OfferService::new(market.store());
        let responses = ResponseService::new(market.store());
        let offer_id = offers
            .create_offer(&Caller::new(ADVERTISER), new_offer("Crypto promo", true))
            .await
            .unwrap()
            .id;
        let channel = market.verified_channel(OWNER_A, -1001).await;
        let response = responses
            .create_response(
                &Caller::new(OWNER_A),
                offer_id,
                NewResponse { channel_id: channel.id, message: None, proposed_price: None },
            )
            .await
            .unwrap();

        let (accepted, conflicts) = spawn_accepts(&responses, vec![response.id; 5]).await;
        assert_eq!((accepted, conflicts), (1, 4));
    }

    #[tokio::test]
    async fn test_reject_has_no_side_effects() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, None).await;

        let rejected = fx.responses.reject_response(&Caller::new(ADVERTISER), response.id).await.unwrap();
        assert_eq!(rejected.status, ResponseStatus::Rejected);

        let offer = fx.offers.get_offer(offer_id).await.unwrap();
        assert_eq!(offer.status, OfferStatus::Active);
        assert!(fx.market.contract_for_offer(offer_id).await.is_none());
    }

    #[tokio::test]
    async fn test_terminal_response_cannot_move() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, None).await;
        let caller = Caller::new(ADVERTISER);

        fx.responses.reject_response(&caller, response.id).await.unwrap();

        let err = fx.responses.accept_response(&caller, response.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { entity: "response", .. }));

        let err = fx.responses.reject_response(&caller, response.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { entity: "response", .. }));
    }

    #[tokio::test]
    async fn test_only_offer_owner_decides() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, None).await;

        let err = fx.responses.accept_response(&Caller::new(OWNER_A), response.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = fx.responses.reject_response(&Caller::new(OWNER_B), response.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = fx.responses.list_responses(&Caller::new(OWNER_A), offer_id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_response_guards() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let own_channel = fx.market.verified_channel(ADVERTISER, -2001).await;
        let unverified = fx.market.pending_channel(OWNER_A, -2002).await;

        // advertiser responding to their own offer
        let err = fx
            .responses
            .create_response(
                &Caller::new(ADVERTISER),
                offer_id,
                NewResponse { channel_id: own_channel.id, message: None, proposed_price: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        // someone else's channel
        let err = fx
            .responses
            .create_response(
                &Caller::new(OWNER_B),
                offer_id,
                NewResponse { channel_id: unverified.id, message: None, proposed_price: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = fx
            .responses
            .create_response(
                &Caller::new(OWNER_A),
                offer_id,
                NewResponse { channel_id: unverified.id, message: None, proposed_price: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = fx
            .responses
            .create_response(
                &Caller::new(OWNER_A),
                offer_id,
                NewResponse { channel_id: unverified.id, message: None, proposed_price: Some(-5) },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = fx
            .responses
            .create_response(
                &Caller::new(OWNER_A),
                9_999,
                NewResponse { channel_id: unverified.id, message: None, proposed_price: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "offer", .. }));
    }

    #[tokio::test]
    async fn test_channel_responds_once_per_offer() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let first = fx.respond(offer_id, OWNER_A, -1001, None).await;

        let err = fx
            .responses
            .create_response(
                &Caller::new(OWNER_A),
                offer_id,
                NewResponse { channel_id: first.channel_id, message: None, proposed_price: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_draft_offer_does_not_accept_responses() {
        let fx = Fixture::new().await;
        let draft = fx
            .offers
            .create_offer(&Caller::new(ADVERTISER), new_offer("Draft", false))
            .await
            .unwrap();
        let channel = fx.market.verified_channel(OWNER_A, -1001).await;

        let err = fx
            .responses
            .create_response(
                &Caller::new(OWNER_A),
                draft.id,
                NewResponse { channel_id: channel.id, message: None, proposed_price: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_responder_can_read_own_response() {
        let fx = Fixture::new().await;
        let offer_id = fx.active_offer().await;
        let response = fx.respond(offer_id, OWNER_A, -1001, None).await;

        assert!(fx.responses.get_response(&Caller::new(OWNER_A), response.id).await.is_ok());
        assert!(fx.responses.get_response(&Caller::new(ADVERTISER), response.id).await.is_ok());

        let err = fx.responses.get_response(&Caller::new(OWNER_B), response.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }
}
