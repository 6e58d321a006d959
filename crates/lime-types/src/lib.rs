//! Shared domain types for the Lime transaction gateway.
//!
//! Every other crate in the workspace speaks in these types: the cached
//! [`TransactionRecord`], the opaque [`OwnershipToken`] that scopes records
//! to a caller, and the upstream views of a transaction and its receipt.

pub mod record;
pub mod token;
pub mod upstream;

pub use record::*;
pub use token::*;
pub use upstream::*;

pub use alloy::primitives::{Address, Bytes, B256, U256};
