use std::sync::Arc;

use adlink_channel::{ChannelService, RecommendationService, VerificationPolicy};
use adlink_contract::ContractService;
use adlink_core::MarketStore;
use adlink_offer::{OfferService, ResponseService};

#[derive(Clone)]
pub struct AppState {
    pub offers: OfferService,
    pub responses: ResponseService,
    pub contracts: ContractService,
    pub channels: ChannelService,
    pub recommendations: RecommendationService,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>, policy: VerificationPolicy) -> Self {
        Self {
            offers: OfferService::new(store.clone()),
            responses: ResponseService::new(store.clone()),
            contracts: ContractService::new(store.clone()),
            channels: ChannelService::new(store.clone(), policy),
            recommendations: RecommendationService::new(store),
        }
    }
}
