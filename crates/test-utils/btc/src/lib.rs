//! Bitcoin fixtures for settlement tests.
//!
//! Provides deterministic keys, funding transactions whose outputs can be spent by test pay-ins,
//! and segwit v0 signing for the wallet-side input types a pay-in may use.

pub mod keys;
pub mod signing;
pub mod transaction;

pub use keys::{scenario_settlement_id, TestKey, BUYER_SEED, SELLER_SEED, WALLET_SEED};
pub use signing::{sign_p2sh_p2wpkh_input, sign_p2wpkh_input};
pub use transaction::{create_funding_tx, create_spending_tx, txout};
