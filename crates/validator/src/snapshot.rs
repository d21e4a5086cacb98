//! In-memory state snapshots

use crate::traits::{StateSource, StateView};
use alloy::primitives::{b256, Address, B256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use types::{KnownAccounts, StateAccessError};

/// Root of an empty storage trie
pub const EMPTY_STORAGE_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Storage roots and slot values captured at a single block.
///
/// Accounts without a recorded root report [`EMPTY_STORAGE_ROOT`], and slots
/// without a recorded value read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    block_number: Option<u64>,
    roots: HashMap<Address, B256>,
    storage: HashMap<Address, HashMap<B256, B256>>,
    unavailable: HashSet<Address>,
}

impl StateSnapshot {
    /// Create an empty snapshot not tied to any block
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty snapshot for the given block
    pub fn at_block(block_number: u64) -> Self {
        Self {
            block_number: Some(block_number),
            ..Self::default()
        }
    }

    /// Block the snapshot was taken at
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    pub fn insert_root(&mut self, address: Address, root: B256) {
        self.roots.insert(address, root);
    }

    pub fn insert_slot(&mut self, address: Address, key: B256, value: B256) {
        self.storage.entry(address).or_default().insert(key, value);
    }

    /// Mark an account whose storage cannot be served
    pub fn mark_unavailable(&mut self, address: Address) {
        self.unavailable.insert(address);
    }

    pub fn with_root(mut self, address: Address, root: B256) -> Self {
        self.insert_root(address, root);
        self
    }

    pub fn with_slot(mut self, address: Address, key: B256, value: B256) -> Self {
        self.insert_slot(address, key, value);
        self
    }

    pub fn with_unavailable(mut self, address: Address) -> Self {
        self.mark_unavailable(address);
        self
    }
}

impl StateView for StateSnapshot {
    fn storage_root(&self, address: Address) -> Result<B256, StateAccessError> {
        if self.unavailable.contains(&address) {
            return Err(StateAccessError::Unavailable { address });
        }
        Ok(self.roots.get(&address).copied().unwrap_or(EMPTY_STORAGE_ROOT))
    }

    fn storage_at(&self, address: Address, key: B256) -> B256 {
        self.storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or(B256::ZERO)
    }
}

/// State source that serves a fixed snapshot
#[derive(Debug, Clone)]
pub struct StaticStateSource {
    name: String,
    snapshot: StateSnapshot,
    available: bool,
}

impl StaticStateSource {
    /// Create a source that always returns `snapshot`
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            name: "static".to_string(),
            snapshot,
            available: true,
        }
    }

    /// Create a source whose backend is down
    pub fn unavailable() -> Self {
        Self {
            name: "static".to_string(),
            snapshot: StateSnapshot::new(),
            available: false,
        }
    }
}

#[async_trait]
impl StateSource for StaticStateSource {
    async fn snapshot(&self, _known_accounts: &KnownAccounts) -> Result<StateSnapshot, StateAccessError> {
        if !self.available {
            return Err(StateAccessError::Rpc {
                method: "snapshot",
                message: "state source unavailable".to_string(),
            });
        }
        Ok(self.snapshot.clone())
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        &self.name
    }
}
