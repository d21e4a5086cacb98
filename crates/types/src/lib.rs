//! Shared types for conditional transactions
//!
//! This crate contains the known-account precondition model, the conditional
//! transaction envelope and the error types used across the workspace.

pub mod conditional;
pub mod error;
pub mod known_account;
pub mod utils;

// Re-export commonly used types
pub use conditional::*;
pub use error::{ConditionalTxError, ConfigError, Result, StateAccessError, TransactionError};
pub use known_account::*;
