//! JSON-RPC backed state source

use crate::snapshot::StateSnapshot;
use crate::traits::StateSource;
use alloy::eips::BlockId;
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use tracing::{debug, warn};
use types::utils::{u256_to_word, word_to_u256};
use types::{KnownAccounts, StateAccessError};

/// State source that reads storage from an Ethereum node.
///
/// Every read for one snapshot is pinned to the block returned by
/// `eth_blockNumber` at the start of the call.
#[derive(Debug, Clone)]
pub struct RpcStateSource {
    name: String,
    rpc_url: String,
}

impl RpcStateSource {
    /// Create a new RPC state source
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            name: "rpc".to_string(),
            rpc_url: rpc_url.into(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

fn rpc_error(method: &'static str) -> impl FnOnce(alloy::transports::TransportError) -> StateAccessError {
    move |e| StateAccessError::Rpc {
        method,
        message: e.to_string(),
    }
}

#[async_trait]
impl StateSource for RpcStateSource {
    async fn snapshot(&self, known_accounts: &KnownAccounts) -> Result<StateSnapshot, StateAccessError> {
        let provider = ProviderBuilder::new().on_http(
            self.rpc_url
                .parse()
                .map_err(|_| StateAccessError::InvalidEndpoint(self.rpc_url.clone()))?,
        );

        let block_number = provider
            .get_block_number()
            .await
            .map_err(rpc_error("eth_blockNumber"))?;
        let block = BlockId::number(block_number);
        let mut snapshot = StateSnapshot::at_block(block_number);

        for (address, account) in known_accounts.iter() {
            if account.has_root_assertion() {
                let proof = provider
                    .get_proof(*address, Vec::new())
                    .block_id(block)
                    .await
                    .map_err(rpc_error("eth_getProof"))?;
                snapshot.insert_root(*address, proof.storage_hash);
            }

            if let Some(slots) = account.slots() {
                for key in slots.keys() {
                    let value = provider
                        .get_storage_at(*address, word_to_u256(*key))
                        .block_id(block)
                        .await
                        .map_err(rpc_error("eth_getStorageAt"))?;
                    snapshot.insert_slot(*address, *key, u256_to_word(value));
                }
            }
        }

        debug!(
            block_number,
            accounts = known_accounts.len(),
            reads = known_accounts.slot_count(),
            "Fetched state snapshot"
        );

        Ok(snapshot)
    }

    async fn is_available(&self) -> bool {
        let url = match self.rpc_url.parse() {
            Ok(url) => url,
            Err(_) => return false,
        };
        let provider = ProviderBuilder::new().on_http(url);

        match provider.get_block_number().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, rpc_url = %self.rpc_url, "State source health check failed");
                false
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
