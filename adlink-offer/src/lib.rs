pub mod lifecycle;
pub mod offers;
pub mod responses;

#[cfg(test)]
mod testing;

pub use lifecycle::{ensure_offer_transition, ensure_response_transition};
pub use offers::OfferService;
pub use responses::ResponseService;
