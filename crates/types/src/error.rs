//! Error types for conditional transaction handling

use alloy::primitives::Address;
use thiserror::Error;

/// Main error type for the conditional transaction system
#[derive(Error, Debug)]
pub enum ConditionalTxError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transaction decoding errors
    #[error("Transaction decoding error: {0}")]
    Transaction(String),

    /// Request exceeds configured limits
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// State backend could not answer a query
    #[error("State access error: {0}")]
    StateAccess(#[from] StateAccessError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for conditional transaction operations
pub type Result<T> = std::result::Result<T, ConditionalTxError>;

/// Errors raised while decoding a conditional transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Raw bytes are not a valid EIP-2718 transaction
    #[error("Invalid transaction encoding: {0}")]
    InvalidEncoding(String),

    /// Bytes left over after the transaction was decoded
    #[error("Unexpected {remaining} trailing bytes after transaction")]
    TrailingBytes { remaining: usize },

    /// Wrapped transaction type cannot carry known accounts
    #[error("Unsupported inner transaction type: {ty:#04x}")]
    UnsupportedInnerType { ty: u8 },

    /// Known accounts object could not be decoded
    #[error("Invalid known accounts: {0}")]
    InvalidKnownAccounts(String),
}

/// Errors returned by a state backend.
///
/// These mean the verdict is undetermined, never that a transaction is invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateAccessError {
    /// State for the account cannot be served (pruned, missing trie node)
    #[error("State unavailable for account {address}")]
    Unavailable { address: Address },

    /// JSON-RPC call failed
    #[error("RPC call {method} failed: {message}")]
    Rpc { method: &'static str, message: String },

    /// RPC endpoint could not be parsed
    #[error("Invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },
}

impl From<TransactionError> for ConditionalTxError {
    fn from(err: TransactionError) -> Self {
        ConditionalTxError::Transaction(err.to_string())
    }
}

impl From<ConfigError> for ConditionalTxError {
    fn from(err: ConfigError) -> Self {
        ConditionalTxError::Config(err.to_string())
    }
}
