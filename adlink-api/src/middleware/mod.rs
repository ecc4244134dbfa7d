pub mod identity;

pub use identity::{CurrentUser, USER_ID_HEADER};
