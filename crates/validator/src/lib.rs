//! Known-account validation for conditional transactions
//!
//! This crate checks a conditional transaction's declared preconditions
//! against a point-in-time view of account storage, and provides the state
//! sources that produce such views.

pub mod rpc;
pub mod snapshot;
pub mod traits;
pub mod validation;

pub use rpc::*;
pub use snapshot::*;
pub use traits::*;
pub use validation::*;
