//! File system operations with transaction support.
//!
//! Provides atomic file rewrites that either land completely or not at all.

pub mod transaction;

pub use transaction::{Transaction, TransactionStats};
