pub mod models;

pub use models::{
    Channel, ChannelStatus, Contract, ContractStatus, NewChannel, NewContract, NewOffer,
    NewResponse, Offer, OfferFilter, OfferResponse, OfferStatus, ParseStatusError,
    ResponseStatus, UserId, VerificationUpdate,
};
