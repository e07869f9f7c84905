//! Error types for subnet staking.
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid base58 string")] InvalidBase58,
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid length: expected {expected}, got {got}")] InvalidLength { expected: usize, got: usize },
    #[error("missing prefix {0:?}")] MissingPrefix(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("missing chain alias")] MissingChainAlias,
    #[error("missing separator")] MissingSeparator,
    #[error("invalid HRP")] InvalidHrp,
    #[error("invalid length")] InvalidLength,
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("invalid padding bits")] InvalidPadding,
    #[error("mixed case")] MixedCase,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid secret key: {0}")] InvalidSecretKey(String),
    #[error("signature verification failed")] VerificationFailed,
}

/// Local validation failures of a staking request. No network call has been made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("malformed subnet id {value:?}: {source}")] SubnetId { value: String, source: IdError },
    #[error("malformed node id {value:?}: {source}")] NodeId { value: String, source: IdError },
    #[error("malformed address {value:?}: {source}")] Address { value: String, source: AddressError },
    #[error("empty node id list")] EmptyNodeIds,
    #[error("duplicate node id {0}")] DuplicateNodeId(String),
    #[error("zero validate weight")] ZeroWeight,
    #[error("{field} {value:?} is not an RFC3339 timestamp: {reason}")] Timestamp { field: &'static str, value: String, reason: String },
    #[error("validation window is empty: end {end} is not after start {start}")] EmptyWindow { start: String, end: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no eligible UTXOs")] NoEligibleUtxos,
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: u64, need: u64 },
    #[error("amount overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("input {index} ({utxo}) is not spendable by this key")] UnknownInput { index: usize, utxo: String },
    #[error("input {index} needs a signature from {address}, which this key does not hold")] ForeignSlot { index: usize, address: String },
    #[error("input {index} cannot carry {required} signatures with {slots} signature slot(s)")] SignatureCount { index: usize, required: usize, slots: usize },
    #[error("credential count {got} does not match {expected} signature groups")] CredentialCount { expected: usize, got: usize },
    #[error("key does not meet the control threshold of subnet {subnet_id}")] NotSubnetOwner { subnet_id: String },
}

/// Failures talking to the chain: transport, timeouts, and remote rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("request timed out after {0:?}")] Timeout(Duration),
    #[error("transport: {0}")] Transport(String),
    #[error("malformed response: {0}")] Decode(String),
    #[error("transaction {tx_id} rejected: {reason}")] Rejected { tx_id: String, reason: String },
    #[error("transaction {tx_id} issued but not committed within {after:?}")] Unconfirmed { tx_id: String, after: Duration },
    #[error(transparent)] Selection(#[from] SelectionError),
    #[error(transparent)] Signing(#[from] SigningError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("invalid input: {0}")] InvalidInput(#[from] InputError),
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: u64, need: u64 },
    #[error("selection failed: {0}")] Selection(#[from] SelectionError),
    #[error("signing failed: {0}")] Signing(#[from] SigningError),
    #[error("submission for {node_id} failed: {source}")] Submission { node_id: String, source: ChainError },
    #[error("chain query failed: {0}")] Chain(#[from] ChainError),
}

impl StakeError {
    /// True for failures detected locally, before anything reached the chain.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            StakeError::InvalidInput(_)
                | StakeError::InsufficientFunds { .. }
                | StakeError::Selection(_)
                | StakeError::Signing(_)
        )
    }
}
