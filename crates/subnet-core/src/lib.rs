//! # subnet-core
//! Identifiers, addresses, keys, transactions, and error types shared by the
//! staking wallet crates.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod ids;
pub mod types;
