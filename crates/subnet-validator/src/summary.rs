//! Cost and action summary shown before confirmation and after reconciliation.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use subnet_core::constants::UNIT;
use subnet_core::ids::{Id, NodeId};

use crate::request::StakingRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Holder's `P-...` address.
    pub p_address: String,
    pub reward_address: String,
    pub change_address: String,
    pub balance: u64,
    /// Per-transaction fee. Zero once everything has been paid.
    pub tx_fee: u64,
    pub subnet_id: Id,
    pub node_ids: Vec<NodeId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub weight: u64,
}

impl Summary {
    pub fn new(
        request: &StakingRequest,
        p_address: String,
        reward_address: String,
        change_address: String,
        balance: u64,
        tx_fee: u64,
    ) -> Self {
        Self {
            p_address,
            reward_address,
            change_address,
            balance,
            tx_fee,
            subnet_id: request.subnet_id,
            node_ids: request.node_ids.clone(),
            start: request.start,
            end: request.end,
            weight: request.weight,
        }
    }

    /// Fee for submitting one transaction per node.
    pub fn total_fee(&self) -> u64 {
        self.tx_fee.saturating_mul(self.node_ids.len() as u64)
    }

    /// Reconciled view: fee spent, new balance.
    pub fn reconciled(&self, balance: u64) -> Self {
        Self {
            balance,
            tx_fee: 0,
            ..self.clone()
        }
    }
}

/// Format base units as whole units with nine decimals.
pub fn format_units(amount: u64) -> String {
    format!("{}.{:09}", amount / UNIT, amount % UNIT)
}

fn row(f: &mut fmt::Formatter<'_>, key: &str, value: &dyn fmt::Display) -> fmt::Result {
    writeln!(f, "  {key:<18} {value}")
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        row(f, "P-chain address", &self.p_address)?;
        row(f, "Balance", &format_units(self.balance))?;
        row(f, "Tx fee", &format_units(self.tx_fee))?;
        row(
            f,
            "Total fee",
            &format!("{} ({} txs)", format_units(self.total_fee()), self.node_ids.len()),
        )?;
        row(f, "Reward address", &self.reward_address)?;
        row(f, "Change address", &self.change_address)?;
        row(f, "Subnet ID", &self.subnet_id)?;
        for (i, node_id) in self.node_ids.iter().enumerate() {
            let label = if i == 0 { "Node IDs" } else { "" };
            row(f, label, node_id)?;
        }
        row(
            f,
            "Validate start",
            &self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        row(
            f,
            "Validate end",
            &self.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        row(f, "Validate weight", &self.weight)
    }
}
