pub mod ranking;
pub mod recommendation;
pub mod service;
pub mod verification;

pub use ranking::{ChannelRanker, StableRanker};
pub use recommendation::{Recommendation, RecommendationService};
pub use service::{ChannelService, VerificationState, VerificationTicket};
pub use verification::VerificationPolicy;
