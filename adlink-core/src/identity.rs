use adlink_shared::UserId;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// The user on whose behalf an operation runs, as resolved by the identity
/// layer in front of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
}

impl Caller {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Fails with `Forbidden` unless the caller is `owner`.
    pub fn ensure_owner(&self, owner: UserId, what: &str) -> CoreResult<()> {
        if self.user_id == owner {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("{} belongs to another user", what)))
        }
    }
}
