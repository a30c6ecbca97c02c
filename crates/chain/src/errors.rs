use bitcoin::{OutPoint, Txid};
use bs_primitives::SettlementId;
use bs_settlement::{DeriveError, PayoutError, SignedPayinError};
use thiserror::Error;

/// Errors returned by a [`BlockchainQuery`](crate::BlockchainQuery) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("transaction {0} not found")]
    TxNotFound(Txid),

    #[error("network: {0}")]
    Network(String),

    #[error("broadcast of {txid} rejected: {reason}")]
    Rejected { txid: Txid, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("settlement {0} already registered with different keys")]
    Conflict(SettlementId),

    #[error("derive: {0}")]
    Derive(#[from] DeriveError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    #[error("chain: {0}")]
    Chain(#[from] ChainError),

    #[error("spent output {0} does not exist")]
    MissingOutput(OutPoint),

    #[error("signed payin: {0}")]
    SignedPayin(#[from] SignedPayinError),

    #[error("payout: {0}")]
    Payout(#[from] PayoutError),

    #[error("failed to decode transaction: {0}")]
    Decode(String),
}
