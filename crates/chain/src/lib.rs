//! Blockchain collaborator seam of the settlement core.
//!
//! The verification functions in `bs-settlement` are pure; this crate fetches what they need
//! through [`BlockchainQuery`], feeds it to them and broadcasts what they accept.

mod book;
mod errors;
mod monitor;
mod query;
mod utxos;

pub use book::SettlementBook;
pub use errors::{BookError, ChainError, MonitorError};
pub use monitor::SettlementMonitor;
#[cfg(any(test, feature = "test-utils"))]
pub use query::MockBlockchainQuery;
pub use query::BlockchainQuery;
pub use utxos::collect_prev_utxos;
