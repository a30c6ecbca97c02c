//! Fee policy shared by pay-in and pay-out validation.

use bitcoin::Amount;

use crate::SettlementPolicy;

/// Lowest fee rate accepted when `requested` sat/vB was asked for.
///
/// Independently written wallets disagree slightly on size estimates, so the actual rate may fall
/// short of the requested one by the policy tolerance, but never below the minimum relay fee.
pub fn allowed_fee_rate_min(requested: f64, policy: &SettlementPolicy) -> f64 {
    let tolerated = requested * (1.0 - policy.fee_tolerance);
    // f64::max ignores NaN, so garbage rates end up at the floor.
    tolerated.max(policy.min_relay_fee_rate)
}

/// Fee owed by a transaction of `vsize` vbytes at `fee_rate` sat/vB, rounded up.
pub fn fee_for_vsize(fee_rate: f64, vsize: u64) -> Amount {
    Amount::from_sat((fee_rate * vsize as f64).ceil() as u64)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_tolerance_applied() {
        let policy = SettlementPolicy::default();
        assert!((allowed_fee_rate_min(5.0, &policy) - 4.75).abs() < 1e-9);
        assert!((allowed_fee_rate_min(100.0, &policy) - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_applied() {
        let policy = SettlementPolicy::default();
        assert_eq!(allowed_fee_rate_min(1.0, &policy), 1.0);
        assert_eq!(allowed_fee_rate_min(0.2, &policy), 1.0);
        assert_eq!(allowed_fee_rate_min(-3.0, &policy), 1.0);
        assert_eq!(allowed_fee_rate_min(f64::NAN, &policy), 1.0);
    }

    #[test]
    fn test_fee_for_vsize_rounds_up() {
        assert_eq!(fee_for_vsize(4.75, 153), Amount::from_sat(727));
        assert_eq!(fee_for_vsize(1.0, 110), Amount::from_sat(110));
        assert_eq!(fee_for_vsize(0.0, 110), Amount::ZERO);
    }

    proptest! {
        #[test]
        fn proptest_fee_floor_bounds(rate in 1.0f64..100_000.0) {
            let policy = SettlementPolicy::default();
            let min = allowed_fee_rate_min(rate, &policy);
            prop_assert!(min >= 1.0);
            prop_assert!(min <= rate);
        }

        #[test]
        fn proptest_fee_floor_never_below_relay(rate in any::<f64>()) {
            let policy = SettlementPolicy::default();
            prop_assert!(allowed_fee_rate_min(rate, &policy) >= policy.min_relay_fee_rate);
        }
    }
}
