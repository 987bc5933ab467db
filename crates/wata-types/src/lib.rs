//! Wata Types - Canonical domain types for wallet identity and balances
//!
//! This crate contains the foundational types shared by every Wata crate,
//! with zero dependencies on other wata crates:
//!
//! - Canonical account addresses and free-text address normalization
//! - Supported currencies and decimal balance arithmetic
//! - Account and audit-record entities with validated constructors
//! - The coded error taxonomy surfaced to callers
//! - An injectable clock
//!
//! # Invariants
//!
//! 1. An account's address never changes after creation
//! 2. Balances are never negative
//! 3. Audit records are append-only

pub mod address;
pub mod currency;
pub mod amount;
pub mod account;
pub mod transaction;
pub mod clock;
pub mod error;

pub use address::*;
pub use currency::*;
pub use amount::*;
pub use account::*;
pub use transaction::*;
pub use clock::*;
pub use error::*;
