//! Calling entitlement gate
//!
//! Billing and subscription checks live outside this subsystem; the
//! dispatcher only asks whether a user may place calls right now. The check
//! runs once per dispatch request, never per number.

use std::collections::HashSet;

use uuid::Uuid;

use super::shared::result::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EntitlementService: Send + Sync {
    /// Whether the user currently holds an active calling entitlement.
    async fn can_place_calls(&self, user_id: Uuid) -> Result<bool>;
}

/// Static entitlement table. Deployments front a real billing service; this
/// adapter serves development and tests.
pub struct StaticEntitlements {
    allow_all: bool,
    allowed: HashSet<Uuid>,
}

impl StaticEntitlements {
    /// Every user may place calls.
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            allowed: HashSet::new(),
        }
    }

    /// No user may place calls.
    pub fn deny_all() -> Self {
        Self {
            allow_all: false,
            allowed: HashSet::new(),
        }
    }

    /// Only the listed users may place calls.
    pub fn only(users: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            allow_all: false,
            allowed: users.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl EntitlementService for StaticEntitlements {
    async fn can_place_calls(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.allow_all || self.allowed.contains(&user_id))
    }
}
