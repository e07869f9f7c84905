//! Staking request parsing and workflow configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use subnet_core::address::Address;
use subnet_core::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use subnet_core::error::InputError;
use subnet_core::ids::{Id, NodeId, ShortId};
use subnet_core::types::SubnetValidator;

/// Workflow settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Deadline for each chain call, including every submission.
    pub request_timeout: Duration,
    /// Ask for confirmation before submitting anything.
    pub enable_prompt: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            enable_prompt: true,
        }
    }
}

/// Raw, unvalidated request as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StakingArgs {
    pub subnet_id: String,
    pub node_ids: Vec<String>,
    /// RFC3339.
    pub validate_start: String,
    /// RFC3339.
    pub validate_end: String,
    pub validate_weight: u64,
    /// `P-...` address. Defaults to the holder.
    pub reward_address: Option<String>,
    /// `P-...` address. Defaults to the holder.
    pub change_address: Option<String>,
}

/// A validated request: add every node in `node_ids` to `subnet_id` for
/// `[start, end)` with `weight`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingRequest {
    pub subnet_id: Id,
    pub node_ids: Vec<NodeId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub weight: u64,
    pub reward_addr: ShortId,
    pub change_addr: ShortId,
}

impl StakingArgs {
    /// Validate every field. Pure: nothing here touches the network.
    ///
    /// `holder` fills in missing reward and change addresses.
    pub fn parse(&self, holder: ShortId) -> Result<StakingRequest, InputError> {
        let subnet_id: Id = self
            .subnet_id
            .trim()
            .parse()
            .map_err(|source| InputError::SubnetId {
                value: self.subnet_id.clone(),
                source,
            })?;

        let mut node_ids = Vec::with_capacity(self.node_ids.len());
        let mut seen = BTreeSet::new();
        for raw in &self.node_ids {
            let node_id: NodeId = raw.parse().map_err(|source| InputError::NodeId {
                value: raw.clone(),
                source,
            })?;
            if !seen.insert(node_id) {
                return Err(InputError::DuplicateNodeId(node_id.to_string()));
            }
            node_ids.push(node_id);
        }
        if node_ids.is_empty() {
            return Err(InputError::EmptyNodeIds);
        }

        if self.validate_weight == 0 {
            return Err(InputError::ZeroWeight);
        }

        let start = parse_timestamp("validate-start", &self.validate_start)?;
        let end = parse_timestamp("validate-end", &self.validate_end)?;
        if end <= start {
            return Err(InputError::EmptyWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        Ok(StakingRequest {
            subnet_id,
            node_ids,
            start,
            end,
            weight: self.validate_weight,
            reward_addr: parse_address(self.reward_address.as_deref(), holder)?,
            change_addr: parse_address(self.change_address.as_deref(), holder)?,
        })
    }
}

impl StakingRequest {
    /// Validator entry for one node of this request.
    pub fn validator(&self, node_id: NodeId) -> SubnetValidator {
        SubnetValidator {
            node_id,
            start: unix_secs(&self.start),
            end: unix_secs(&self.end),
            weight: self.weight,
            subnet_id: self.subnet_id,
        }
    }

    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, InputError> {
    let parsed = DateTime::parse_from_rfc3339(value.trim()).map_err(|e| InputError::Timestamp {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.timestamp() < 0 {
        return Err(InputError::Timestamp {
            field,
            value: value.to_string(),
            reason: "before the unix epoch".to_string(),
        });
    }
    Ok(parsed.with_timezone(&Utc))
}

fn parse_address(value: Option<&str>, holder: ShortId) -> Result<ShortId, InputError> {
    match value {
        None => Ok(holder),
        Some(s) => Address::parse_platform(s.trim())
            .map(|a| a.short_id())
            .map_err(|source| InputError::Address {
                value: s.to_string(),
                source,
            }),
    }
}

// Timestamps are checked non-negative at parse time.
fn unix_secs(t: &DateTime<Utc>) -> u64 {
    t.timestamp().max(0) as u64
}
