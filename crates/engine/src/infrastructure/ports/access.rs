//! Who is calling, and what they may change.

use tablesmith_domain::UserId;

/// The caller of a use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    User(UserId),
    Anonymous,
}

impl Requester {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

impl From<UserId> for Requester {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

/// Ownership check applied before any table mutation.
#[cfg_attr(test, mockall::automock)]
pub trait AccessPolicy: Send + Sync {
    fn can_modify(&self, owner: UserId, requester: &Requester) -> bool;
}

/// Only the owner may modify a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

impl AccessPolicy for OwnerOnly {
    fn can_modify(&self, owner: UserId, requester: &Requester) -> bool {
        requester.user_id() == Some(owner)
    }
}
