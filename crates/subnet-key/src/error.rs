//! Key loading errors.

use subnet_core::error::CryptoError;
use thiserror::Error;

/// Errors that can occur while constructing a key backing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key file could not be read.
    #[error("I/O error: {0}")]
    Io(String),

    /// Key material is malformed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A multisig group needs at least one member.
    #[error("empty key group")]
    EmptyGroup,
}
