pub mod lifecycle;
pub mod manager;

pub use lifecycle::ensure_contract_transition;
pub use manager::ContractService;
