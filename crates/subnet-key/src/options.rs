//! Per-spend options.

use subnet_core::ids::Id;

/// Controls a single [`Spender::spends`](crate::key::Spender::spends) call.
///
/// The zero value means: evaluate lock times at `time = 0` (so only UTXOs
/// without a lock time are eligible), no target amount (sweep every eligible
/// UTXO), no fee deduction, any asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpendOptions {
    /// Unix seconds used for lock-time checks.
    pub time: u64,
    /// Amount to cover. Zero sweeps everything eligible.
    pub target_amount: u64,
    /// Fee paid out of the same selection, on top of `target_amount`.
    pub fee_deduct: u64,
    /// Only select UTXOs of this asset.
    pub asset_id: Option<Id>,
}

impl SpendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    pub fn with_target_amount(mut self, amount: u64) -> Self {
        self.target_amount = amount;
        self
    }

    pub fn with_fee_deduct(mut self, fee: u64) -> Self {
        self.fee_deduct = fee;
        self
    }

    pub fn with_asset_id(mut self, asset_id: Id) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn is_sweep(&self) -> bool {
        self.target_amount == 0
    }

    /// `target_amount + fee_deduct`, or `None` on overflow.
    pub fn required(&self) -> Option<u64> {
        self.target_amount.checked_add(self.fee_deduct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero_sweep() {
        let opts = SpendOptions::default();
        assert_eq!(opts.time, 0);
        assert!(opts.is_sweep());
        assert_eq!(opts.required(), Some(0));
        assert_eq!(opts.asset_id, None);
    }

    #[test]
    fn setters_compose() {
        let opts = SpendOptions::new()
            .with_time(10)
            .with_target_amount(500)
            .with_fee_deduct(7)
            .with_asset_id(Id([1; 32]));
        assert_eq!(opts.required(), Some(507));
        assert!(!opts.is_sweep());
        assert_eq!(opts.asset_id, Some(Id([1; 32])));
    }

    #[test]
    fn required_overflow() {
        let opts = SpendOptions::new()
            .with_target_amount(u64::MAX)
            .with_fee_deduct(1);
        assert_eq!(opts.required(), None);
    }
}
