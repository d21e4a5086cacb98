//! Known-account validation

use crate::traits::{StateSource, StateView};
use tracing::{debug, info};
use types::{EnvelopeFields, StateAccessError, CONDITIONAL_TX_TYPE};

/// Check a transaction's known accounts against `state`.
///
/// Returns `Ok(false)` for transactions that are not conditional; callers
/// should treat that as "not applicable" rather than "invalid". Every storage
/// root is read before anything is compared, so a failed read is returned
/// whatever the other preconditions hold.
pub fn is_valid_conditional_transaction<T, S>(tx: &T, state: &S) -> Result<bool, StateAccessError>
where
    T: EnvelopeFields + ?Sized,
    S: StateView + ?Sized,
{
    if tx.tx_type() != CONDITIONAL_TX_TYPE {
        return Ok(false);
    }
    let Some(known_accounts) = tx.known_accounts() else {
        return Ok(false);
    };

    let mut roots = Vec::new();
    for (address, account) in known_accounts.iter() {
        if let Some(expected) = account.root() {
            roots.push((address, expected, state.storage_root(*address)?));
        }
    }

    for (address, expected, current) in roots {
        if current != expected {
            debug!(%address, %expected, %current, "Storage root mismatch");
            return Ok(false);
        }
    }

    // Slot reads cannot fail
    for (address, account) in known_accounts.iter() {
        if let Some(slots) = account.slots() {
            for (key, expected) in slots {
                let current = state.storage_at(*address, *key);
                if current != *expected {
                    debug!(%address, %key, %expected, %current, "Storage slot mismatch");
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

/// Result of validating a transaction against a fetched snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether every known account matched
    pub is_valid: bool,
    /// Whether the transaction carries known accounts at all
    pub applicable: bool,
    /// Block the state was read at
    pub block_number: Option<u64>,
}

/// Validator that fetches state from a [`StateSource`] before checking
#[derive(Debug, Clone)]
pub struct ConditionalValidator<S> {
    source: S,
}

impl<S: StateSource> ConditionalValidator<S> {
    /// Create a new validator over `source`
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Snapshot the declared accounts and check them.
    ///
    /// Non-conditional transactions are reported as not applicable without
    /// touching the state source.
    pub async fn validate<T>(&self, tx: &T) -> Result<ValidationOutcome, StateAccessError>
    where
        T: EnvelopeFields + Sync + ?Sized,
    {
        let known_accounts = match tx.known_accounts() {
            Some(known) if tx.tx_type() == CONDITIONAL_TX_TYPE => known,
            _ => {
                return Ok(ValidationOutcome {
                    is_valid: false,
                    applicable: false,
                    block_number: None,
                })
            }
        };

        let snapshot = self.source.snapshot(known_accounts).await?;
        let is_valid = is_valid_conditional_transaction(tx, &snapshot)?;

        info!(
            source = self.source.name(),
            block_number = ?snapshot.block_number(),
            accounts = known_accounts.len(),
            is_valid,
            "Validated known accounts"
        );

        Ok(ValidationOutcome {
            is_valid,
            applicable: true,
            block_number: snapshot.block_number(),
        })
    }
}
