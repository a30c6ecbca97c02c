//! Protocol policy constants and the context handed to every verification entry point.

use bitcoin::{Amount, Network};
use serde::{Deserialize, Serialize};

/// Default tolerance below the requested fee rate: actual fees may be 5% lower than asked.
pub const DEFAULT_FEE_TOLERANCE: f64 = 0.05;

/// Default network minimum relay fee rate, in sat/vB.
pub const DEFAULT_MIN_RELAY_FEE_RATE: f64 = 1.0;

/// Default dust threshold for native segwit outputs, in sats.
pub const DEFAULT_NATIVE_SEGWIT_DUST: u64 = 294;

/// Default dust threshold for nested segwit outputs, in sats.
pub const DEFAULT_NESTED_SEGWIT_DUST: u64 = 540;

/// Default upper bound of a pay-out's virtual size, in vbytes.
///
/// A pay-out always has one settlement input and one output.
pub const DEFAULT_PAYOUT_MAX_VSIZE: u64 = 123;

/// Tunable protocol parameters.
///
/// Both counterparties must run with the same values; the defaults are the ones the trading
/// protocol has always used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementPolicy {
    /// Fraction by which the actual fee rate may undershoot the requested one.
    pub fee_tolerance: f64,

    /// Absolute floor of the accepted fee rate, in sat/vB.
    pub min_relay_fee_rate: f64,

    /// Non-settlement pay-in outputs at or below this value are rejected.
    pub native_segwit_dust_sat: u64,

    /// Dust threshold used when sizing the smallest tradeable amount.
    pub nested_segwit_dust_sat: u64,

    /// Virtual size assumed for a pay-out when sizing the smallest tradeable amount.
    pub payout_max_vsize: u64,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            fee_tolerance: DEFAULT_FEE_TOLERANCE,
            min_relay_fee_rate: DEFAULT_MIN_RELAY_FEE_RATE,
            native_segwit_dust_sat: DEFAULT_NATIVE_SEGWIT_DUST,
            nested_segwit_dust_sat: DEFAULT_NESTED_SEGWIT_DUST,
            payout_max_vsize: DEFAULT_PAYOUT_MAX_VSIZE,
        }
    }
}

impl SettlementPolicy {
    pub fn native_segwit_dust(&self) -> Amount {
        Amount::from_sat(self.native_segwit_dust_sat)
    }

    pub fn nested_segwit_dust(&self) -> Amount {
        Amount::from_sat(self.nested_segwit_dust_sat)
    }
}

/// Network and policy under which a verification runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifyContext {
    pub network: Network,
    pub policy: SettlementPolicy,
}

impl VerifyContext {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            policy: SettlementPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }
}
