//! Protocol constants. Monetary values are in base units (1 unit = 10^9 base units).

pub const UNIT: u64 = 1_000_000_000;

pub const MILLI_UNIT: u64 = UNIT / 1_000;

/// Prefix carried by every node identifier in its string form.
pub const NODE_ID_PREFIX: &str = "NodeID-";

/// Chain alias prepended to formatted platform-chain addresses.
pub const PLATFORM_CHAIN_ALIAS: &str = "P";

/// Canonical encoding version written at the front of every transaction.
pub const CODEC_VERSION: u16 = 0;

/// Stake weight used when the operator does not pass one.
pub const DEFAULT_VALIDATE_WEIGHT: u64 = 1_000;

/// Default delay between "now" and the start of the validation window.
pub const DEFAULT_START_DELAY_SECS: i64 = 60;

/// Default length of the validation window (50 days).
pub const DEFAULT_VALIDATION_PERIOD_SECS: i64 = 50 * 24 * 60 * 60;

/// Deadline for a single validator submission, including confirmation polling.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Interval between transaction status polls.
pub const TX_STATUS_POLL_MILLIS: u64 = 500;

/// Well-known network IDs.
pub const MAINNET_ID: u32 = 1;
pub const FUJI_ID: u32 = 5;
pub const LOCAL_ID: u32 = 12_345;

/// Human-readable address prefix for a network ID.
pub fn hrp_for_network(network_id: u32) -> &'static str {
    match network_id {
        MAINNET_ID => "avax",
        FUJI_ID => "fuji",
        LOCAL_ID => "local",
        _ => "custom",
    }
}
