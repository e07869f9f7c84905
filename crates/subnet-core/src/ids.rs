//! Ledger identifiers and their cb58 string form.
//!
//! cb58 is base58 over `payload || sha256(payload)[28..32]`. Transaction,
//! asset, chain, and subnet IDs are 32-byte [`Id`]s; addresses and node IDs
//! are 20-byte [`ShortId`]s. Node IDs additionally carry the `NodeID-` prefix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::constants::NODE_ID_PREFIX;
use crate::error::IdError;

const CHECKSUM_LEN: usize = 4;

/// Encode bytes as cb58.
pub fn cb58_encode(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    bs58::encode(data).into_string()
}

/// Decode a cb58 string, verifying its checksum.
pub fn cb58_decode(s: &str) -> Result<Vec<u8>, IdError> {
    let data = bs58::decode(s)
        .into_vec()
        .map_err(|_| IdError::InvalidBase58)?;
    if data.len() < CHECKSUM_LEN {
        return Err(IdError::InvalidLength {
            expected: CHECKSUM_LEN,
            got: data.len(),
        });
    }
    let (payload, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    let digest = Sha256::digest(payload);
    if checksum != &digest[digest.len() - CHECKSUM_LEN..] {
        return Err(IdError::InvalidChecksum);
    }
    Ok(payload.to_vec())
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], IdError> {
    let bytes = cb58_decode(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| IdError::InvalidLength {
        expected: N,
        got: len,
    })
}

/// A 32-byte identifier (transaction, asset, blockchain, subnet).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(pub [u8; 32]);

impl Id {
    /// The all-zero ID. Names the primary network when used as a subnet.
    pub const EMPTY: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// SHA-256 of `data` as an ID.
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cb58_encode(&self.0))
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

/// A 20-byte identifier (address or node ID payload).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ShortId(pub [u8; 20]);

impl ShortId {
    pub const EMPTY: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse `<prefix><cb58>`, rejecting strings without the prefix.
    pub fn from_prefixed_str(s: &str, prefix: &'static str) -> Result<Self, IdError> {
        let rest = s
            .strip_prefix(prefix)
            .ok_or(IdError::MissingPrefix(prefix))?;
        rest.parse()
    }

    pub fn prefixed_string(&self, prefix: &str) -> String {
        format!("{prefix}{self}")
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cb58_encode(&self.0))
    }
}

impl FromStr for ShortId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

/// Identity of a validating node, written `NodeID-<cb58>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub ShortId);

impl NodeId {
    pub fn short_id(&self) -> ShortId {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.prefixed_string(NODE_ID_PREFIX))
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShortId::from_prefixed_str(s.trim(), NODE_ID_PREFIX).map(Self)
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Id);
string_serde!(ShortId);
string_serde!(NodeId);
