//! Conditional transaction envelope
//!
//! Wraps a signed transaction together with the known-account preconditions
//! that must hold for it to be included.

use crate::error::TransactionError;
use crate::known_account::KnownAccounts;
use alloy::consensus::{
    SignableTransaction, Signed, Transaction as ConsensusTransaction, TxEip1559, TxEnvelope,
};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Bytes, ChainId, Signature, TxKind, B256, U256};
use serde::{Deserialize, Serialize};

/// Type tag reported by conditional transactions
pub const CONDITIONAL_TX_TYPE: u8 = 0x50;

/// Envelope-level fields shared by every transaction kind
pub trait EnvelopeFields {
    /// Transaction type tag
    fn tx_type(&self) -> u8;

    fn chain_id(&self) -> Option<ChainId>;

    fn access_list(&self) -> Option<&AccessList>;

    /// Call data
    fn input(&self) -> &[u8];

    fn gas_limit(&self) -> u64;

    /// Fee cap
    fn max_fee_per_gas(&self) -> u128;

    /// Tip cap
    fn max_priority_fee_per_gas(&self) -> Option<u128>;

    /// Legacy gas price
    fn gas_price(&self) -> Option<u128>;

    fn value(&self) -> U256;

    fn nonce(&self) -> u64;

    /// Recipient, or `Create` for contract deployments
    fn to(&self) -> TxKind;

    fn signature(&self) -> &Signature;

    /// Preconditions attached to the transaction, if it carries any
    fn known_accounts(&self) -> Option<&KnownAccounts> {
        None
    }
}

impl<T: ConsensusTransaction> EnvelopeFields for Signed<T> {
    fn tx_type(&self) -> u8 {
        self.tx().ty()
    }

    fn chain_id(&self) -> Option<ChainId> {
        self.tx().chain_id()
    }

    fn access_list(&self) -> Option<&AccessList> {
        self.tx().access_list()
    }

    fn input(&self) -> &[u8] {
        self.tx().input()
    }

    fn gas_limit(&self) -> u64 {
        self.tx().gas_limit()
    }

    fn max_fee_per_gas(&self) -> u128 {
        self.tx().max_fee_per_gas()
    }

    fn max_priority_fee_per_gas(&self) -> Option<u128> {
        self.tx().max_priority_fee_per_gas()
    }

    fn gas_price(&self) -> Option<u128> {
        self.tx().gas_price()
    }

    fn value(&self) -> U256 {
        self.tx().value()
    }

    fn nonce(&self) -> u64 {
        self.tx().nonce()
    }

    fn to(&self) -> TxKind {
        self.tx().to()
    }

    fn signature(&self) -> &Signature {
        Signed::signature(self)
    }
}

/// A signed transaction that is only valid while its known accounts hold
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalTransaction<T = TxEip1559> {
    inner: Signed<T>,
    known_accounts: KnownAccounts,
}

impl<T> ConditionalTransaction<T> {
    /// Wrap a signed transaction with its preconditions
    pub fn new(inner: Signed<T>, known_accounts: KnownAccounts) -> Self {
        Self {
            inner,
            known_accounts,
        }
    }

    /// The wrapped signed transaction
    pub fn inner(&self) -> &Signed<T> {
        &self.inner
    }

    /// Hash of the wrapped signed transaction
    pub fn hash(&self) -> B256 {
        *self.inner.hash()
    }

    pub fn into_parts(self) -> (Signed<T>, KnownAccounts) {
        (self.inner, self.known_accounts)
    }
}

impl<T: SignableTransaction<Signature> + Clone> ConditionalTransaction<T> {
    /// Replace the signature of the wrapped transaction.
    ///
    /// The wrapped transaction hash is recomputed for the new signature.
    pub fn set_signature(&mut self, signature: Signature) {
        self.inner = self.inner.tx().clone().into_signed(signature);
    }
}

impl ConditionalTransaction<TxEip1559> {
    /// Decode an EIP-2718 encoded signed EIP-1559 transaction and attach
    /// `known_accounts` to it
    pub fn decode_raw(
        raw: &[u8],
        known_accounts: KnownAccounts,
    ) -> Result<Self, TransactionError> {
        let mut buf = raw;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| TransactionError::InvalidEncoding(e.to_string()))?;

        if !buf.is_empty() {
            return Err(TransactionError::TrailingBytes {
                remaining: buf.len(),
            });
        }

        match envelope {
            TxEnvelope::Eip1559(signed) => Ok(Self::new(signed, known_accounts)),
            other => Err(TransactionError::UnsupportedInnerType {
                ty: ConsensusTransaction::ty(&other),
            }),
        }
    }

    /// EIP-2718 encoding of the wrapped transaction
    pub fn encoded_inner(&self) -> Bytes {
        let envelope: TxEnvelope = self.inner.clone().into();
        Bytes::from(envelope.encoded_2718())
    }
}

impl<T: ConsensusTransaction> EnvelopeFields for ConditionalTransaction<T> {
    fn tx_type(&self) -> u8 {
        CONDITIONAL_TX_TYPE
    }

    fn chain_id(&self) -> Option<ChainId> {
        self.inner.tx().chain_id()
    }

    fn access_list(&self) -> Option<&AccessList> {
        self.inner.tx().access_list()
    }

    fn input(&self) -> &[u8] {
        self.inner.tx().input()
    }

    fn gas_limit(&self) -> u64 {
        self.inner.tx().gas_limit()
    }

    fn max_fee_per_gas(&self) -> u128 {
        self.inner.tx().max_fee_per_gas()
    }

    fn max_priority_fee_per_gas(&self) -> Option<u128> {
        self.inner.tx().max_priority_fee_per_gas()
    }

    // Conditional transactions price gas by their fee cap.
    fn gas_price(&self) -> Option<u128> {
        Some(self.inner.tx().max_fee_per_gas())
    }

    fn value(&self) -> U256 {
        self.inner.tx().value()
    }

    fn nonce(&self) -> u64 {
        self.inner.tx().nonce()
    }

    fn to(&self) -> TxKind {
        self.inner.tx().to()
    }

    fn signature(&self) -> &Signature {
        self.inner.signature()
    }

    fn known_accounts(&self) -> Option<&KnownAccounts> {
        Some(&self.known_accounts)
    }
}

/// Wire form of a conditional transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalTransactionRequest {
    /// Raw signed transaction (EIP-2718 encoded EIP-1559)
    pub tx: Bytes,
    /// Known-account preconditions
    #[serde(flatten)]
    pub known_accounts: KnownAccounts,
}

impl ConditionalTransactionRequest {
    /// Decode the raw transaction and attach the preconditions
    pub fn decode(self) -> Result<ConditionalTransaction, TransactionError> {
        ConditionalTransaction::decode_raw(&self.tx, self.known_accounts)
    }
}

impl From<&ConditionalTransaction> for ConditionalTransactionRequest {
    fn from(tx: &ConditionalTransaction) -> Self {
        Self {
            tx: tx.encoded_inner(),
            known_accounts: tx.known_accounts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::consensus::TxLegacy;
    use alloy::network::TxSignerSync;
    use alloy::primitives::{address, Address};
    use alloy::signers::local::PrivateKeySigner;
    use std::str::FromStr;

    const SIGNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const OTHER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const RECIPIENT: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn unsigned_tx() -> TxEip1559 {
        TxEip1559 {
            chain_id: 1,
            nonce: 7,
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(RECIPIENT),
            value: U256::from(1_000u64),
            input: Bytes::from_static(&[0xde, 0xad]),
            access_list: Default::default(),
        }
    }

    fn sign(key: &str, mut tx: TxEip1559) -> (Signed<TxEip1559>, Signature) {
        let signer = PrivateKeySigner::from_str(key).unwrap();
        let signature = signer.sign_transaction_sync(&mut tx).unwrap();
        (tx.into_signed(signature), signature)
    }

    fn signed_tx() -> Signed<TxEip1559> {
        sign(SIGNER_KEY, unsigned_tx()).0
    }

    fn known_accounts() -> KnownAccounts {
        KnownAccounts::new().with_root(RECIPIENT, B256::with_last_byte(1))
    }

    #[test]
    fn test_accessors_delegate_to_inner() {
        let tx = ConditionalTransaction::new(signed_tx(), known_accounts());

        assert_eq!(tx.tx_type(), CONDITIONAL_TX_TYPE);
        assert_eq!(tx.chain_id(), Some(1));
        assert_eq!(tx.nonce(), 7);
        assert_eq!(tx.gas_limit(), 21_000);
        assert_eq!(tx.max_fee_per_gas(), 30_000_000_000);
        assert_eq!(tx.max_priority_fee_per_gas(), Some(1_000_000_000));
        assert_eq!(tx.gas_price(), Some(30_000_000_000));
        assert_eq!(tx.value(), U256::from(1_000u64));
        assert_eq!(tx.to(), TxKind::Call(RECIPIENT));
        assert_eq!(tx.input(), &[0xde, 0xad]);
        assert_eq!(tx.signature(), signed_tx().signature());
        assert_eq!(tx.known_accounts(), Some(&known_accounts()));
    }

    #[test]
    fn test_plain_transactions_carry_no_known_accounts() {
        let tx = signed_tx();
        assert_eq!(tx.tx_type(), 2);
        assert!(tx.known_accounts().is_none());
    }

    #[test]
    fn test_set_signature_replaces_signature_in_place() {
        let mut tx = ConditionalTransaction::new(signed_tx(), known_accounts());
        let original_hash = tx.hash();
        let (_, other_signature) = sign(OTHER_KEY, unsigned_tx());

        tx.set_signature(other_signature);

        assert_eq!(tx.signature(), &other_signature);
        assert_ne!(tx.hash(), original_hash);
        assert_eq!(tx.nonce(), 7);
        assert_eq!(tx.known_accounts(), Some(&known_accounts()));
    }

    #[test]
    fn test_clone_does_not_share_state() {
        let original = ConditionalTransaction::new(signed_tx(), known_accounts());
        let mut copy = original.clone();
        let (_, other_signature) = sign(OTHER_KEY, unsigned_tx());

        copy.set_signature(other_signature);

        assert_ne!(copy.signature(), original.signature());
        assert_eq!(original.signature(), signed_tx().signature());
    }

    #[test]
    fn test_raw_round_trip() {
        let tx = ConditionalTransaction::new(signed_tx(), known_accounts());
        let raw = tx.encoded_inner();

        let decoded = ConditionalTransaction::decode_raw(&raw, known_accounts()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_decode_raw_rejects_garbage() {
        let err = ConditionalTransaction::decode_raw(&[0x02, 0xff, 0x00], KnownAccounts::new())
            .unwrap_err();
        assert!(matches!(err, TransactionError::InvalidEncoding(_)));
    }

    #[test]
    fn test_decode_raw_rejects_trailing_bytes() {
        let mut raw = ConditionalTransaction::new(signed_tx(), KnownAccounts::new())
            .encoded_inner()
            .to_vec();
        raw.push(0x00);

        let err = ConditionalTransaction::decode_raw(&raw, KnownAccounts::new()).unwrap_err();
        assert_eq!(err, TransactionError::TrailingBytes { remaining: 1 });
    }

    #[test]
    fn test_decode_raw_rejects_legacy_inner() {
        let mut legacy = TxLegacy {
            chain_id: Some(1),
            nonce: 0,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(RECIPIENT),
            value: U256::ZERO,
            input: Bytes::new(),
        };
        let signer = PrivateKeySigner::from_str(SIGNER_KEY).unwrap();
        let signature = signer.sign_transaction_sync(&mut legacy).unwrap();
        let envelope: TxEnvelope = legacy.into_signed(signature).into();

        let err = ConditionalTransaction::decode_raw(&envelope.encoded_2718(), KnownAccounts::new())
            .unwrap_err();
        assert_eq!(err, TransactionError::UnsupportedInnerType { ty: 0 });
    }

    #[test]
    fn test_request_wire_format() {
        let tx = ConditionalTransaction::new(signed_tx(), known_accounts());
        let request = ConditionalTransactionRequest::from(&tx);

        let json = serde_json::to_value(&request).unwrap();
        assert!(json["tx"].as_str().unwrap().starts_with("0x02"));
        assert!(json["knownAccounts"].is_object());

        let parsed: ConditionalTransactionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.decode().unwrap(), tx);
    }
}
