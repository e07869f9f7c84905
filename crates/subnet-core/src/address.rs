//! Platform-chain address formatting.
//!
//! A formatted address is `P-<hrp>1<data><checksum>` where the data part is
//! the 20-byte [`ShortId`] in Bech32 (BIP-173) 5-bit groups. The HRP is chosen
//! from the network ID (see [`hrp_for_network`]).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{PLATFORM_CHAIN_ALIAS, hrp_for_network};
use crate::error::AddressError;
use crate::ids::ShortId;

/// Bech32 checksum constant (BIP-173).
const BECH32_CONST: u32 = 1;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// A raw address bound to a human-readable prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    hrp: String,
    short_id: ShortId,
}

impl Address {
    pub fn new(hrp: impl Into<String>, short_id: ShortId) -> Self {
        Self {
            hrp: hrp.into(),
            short_id,
        }
    }

    /// Address using the HRP registered for `network_id`.
    pub fn for_network(network_id: u32, short_id: ShortId) -> Self {
        Self::new(hrp_for_network(network_id), short_id)
    }

    pub fn short_id(&self) -> ShortId {
        self.short_id
    }

    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    /// Bech32 form without the chain alias, e.g. `fuji1...`.
    pub fn bech32(&self) -> String {
        let data = convert_bits(self.short_id.as_bytes(), 8, 5, true).unwrap_or_default();
        let checksum = create_checksum(&self.hrp, &data);
        let mut out = String::with_capacity(self.hrp.len() + 1 + data.len() + checksum.len());
        out.push_str(&self.hrp);
        out.push('1');
        out.extend(data.iter().chain(&checksum).map(|&d| CHARSET[d as usize] as char));
        out
    }

    /// Parse `P-<bech32>`.
    pub fn parse_platform(s: &str) -> Result<Self, AddressError> {
        let rest = s
            .strip_prefix(PLATFORM_CHAIN_ALIAS)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or(AddressError::MissingChainAlias)?;
        Self::parse_bech32(rest)
    }

    /// Parse a bare Bech32 address.
    pub fn parse_bech32(s: &str) -> Result<Self, AddressError> {
        if s.chars().any(|c| c.is_ascii_lowercase()) && s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AddressError::MixedCase);
        }
        let lower = s.to_ascii_lowercase();
        let sep = lower.rfind('1').ok_or(AddressError::MissingSeparator)?;
        if sep == 0 {
            return Err(AddressError::InvalidHrp);
        }
        if sep + 7 > lower.len() {
            return Err(AddressError::InvalidLength);
        }
        let (hrp, data_part) = (&lower[..sep], &lower[sep + 1..]);

        let data = data_part
            .chars()
            .map(|c| {
                CHARSET
                    .iter()
                    .position(|&ch| ch as char == c)
                    .map(|p| p as u8)
                    .ok_or(AddressError::InvalidCharacter(c))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        if !verify_checksum(hrp, &data) {
            return Err(AddressError::InvalidChecksum);
        }
        let payload = convert_bits(&data[..data.len() - 6], 5, 8, false)
            .ok_or(AddressError::InvalidPadding)?;
        let bytes: [u8; 20] = payload
            .try_into()
            .map_err(|_| AddressError::InvalidLength)?;
        Ok(Self::new(hrp, ShortId(bytes)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PLATFORM_CHAIN_ALIAS}-{}", self.bech32())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_platform(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_platform(&s).map_err(serde::de::Error::custom)
    }
}

// --- Bech32 internals ---

fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    values.iter().fold(1u32, |chk, &v| {
        let top = chk >> 25;
        let mut next = ((chk & 0x1ffffff) << 5) ^ u32::from(v);
        for (i, g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                next ^= g;
            }
        }
        next
    })
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    bytes
        .iter()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(bytes.iter().map(|b| b & 31))
        .collect()
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; 6] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; 6]);
    let pm = polymod(&values) ^ BECH32_CONST;
    std::array::from_fn(|i| ((pm >> (5 * (5 - i))) & 31) as u8)
}

fn verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    polymod(&values) == BECH32_CONST
}

/// Regroup bits, e.g. 8-bit bytes into 5-bit Bech32 symbols.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Option<Vec<u8>> {
    let max = (1u32 << to) - 1;
    let (mut acc, mut bits) = (0u32, 0u32);
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for &value in data {
        if u32::from(value) >> from != 0 {
            return None;
        }
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max) != 0 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FUJI_ID, LOCAL_ID};

    #[test]
    fn format_has_chain_alias_and_hrp() {
        let addr = Address::for_network(FUJI_ID, ShortId([0x11; 20]));
        let s = addr.to_string();
        assert!(s.starts_with("P-fuji1"), "{s}");
        // alias(2) + hrp(4) + sep(1) + 32 data + 6 checksum
        assert_eq!(s.len(), 2 + 4 + 1 + 32 + 6);
    }

    #[test]
    fn parse_roundtrip() {
        let addr = Address::for_network(LOCAL_ID, ShortId([0xab; 20]));
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(parsed.hrp(), "local");
    }

    #[test]
    fn bip173_reference_vector_checks() {
        // Valid Bech32 string from BIP-173 (empty data part).
        assert!(!verify_checksum("a", &[]));
        let data: Vec<u8> = "2uel5l"
            .chars()
            .map(|c| CHARSET.iter().position(|&ch| ch as char == c).unwrap() as u8)
            .collect();
        assert!(verify_checksum("a", &data));
    }

    #[test]
    fn missing_alias_rejected() {
        let addr = Address::for_network(FUJI_ID, ShortId([1; 20]));
        assert_eq!(
            addr.bech32().parse::<Address>().unwrap_err(),
            AddressError::MissingChainAlias
        );
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let mut s = Address::for_network(FUJI_ID, ShortId([2; 20])).to_string();
        let last = s.pop().unwrap();
        s.push(if last == 'q' { 'p' } else { 'q' });
        assert_eq!(s.parse::<Address>().unwrap_err(), AddressError::InvalidChecksum);
    }

    #[test]
    fn mixed_case_rejected() {
        assert_eq!(
            Address::parse_bech32("Fuji1qqqqqq").unwrap_err(),
            AddressError::MixedCase
        );
    }

    #[test]
    fn invalid_character_rejected() {
        assert_eq!(
            Address::parse_bech32("fuji1bbbbbbbbb").unwrap_err(),
            AddressError::InvalidCharacter('b')
        );
    }

    #[test]
    fn uppercase_accepted() {
        let addr = Address::for_network(FUJI_ID, ShortId([3; 20]));
        let upper = addr.bech32().to_ascii_uppercase();
        assert_eq!(Address::parse_bech32(&upper).unwrap(), addr);
    }

    #[test]
    fn serde_json_roundtrip() {
        let addr = Address::for_network(FUJI_ID, ShortId([4; 20]));
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
