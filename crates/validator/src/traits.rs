//! State access traits and interfaces

use crate::snapshot::StateSnapshot;
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use std::sync::Arc;
use types::{KnownAccounts, StateAccessError};

/// Read-only, point-in-time view over account storage
pub trait StateView {
    /// Current storage root of an account
    fn storage_root(&self, address: Address) -> Result<B256, StateAccessError>;

    /// Current value of a storage slot, zero if never set
    fn storage_at(&self, address: Address, key: B256) -> B256;
}

/// Trait for backends that produce state snapshots
#[async_trait]
pub trait StateSource: Send + Sync {
    /// Fetch everything needed to check `known_accounts`, pinned to one block
    async fn snapshot(&self, known_accounts: &KnownAccounts) -> Result<StateSnapshot, StateAccessError>;

    /// Check if the backend is reachable
    async fn is_available(&self) -> bool;

    /// Get the name of the state source
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: StateSource + ?Sized> StateSource for Arc<S> {
    async fn snapshot(&self, known_accounts: &KnownAccounts) -> Result<StateSnapshot, StateAccessError> {
        (**self).snapshot(known_accounts).await
    }

    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
