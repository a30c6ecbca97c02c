use async_trait::async_trait;
use bitcoin::{Transaction, Txid};

use crate::ChainError;

/// Read and broadcast access to the blockchain.
///
/// Implementations may be called from any task.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BlockchainQuery: Send + Sync {
    /// Fetches a transaction by id.
    async fn get_tx_by_hash(&self, txid: Txid) -> Result<Transaction, ChainError>;

    /// Fetches several transactions at once.
    ///
    /// Transactions that are not found are omitted from the result.
    async fn get_txs_by_hash(&self, txids: Vec<Txid>) -> Result<Vec<Transaction>, ChainError>;

    /// Broadcasts a zero-confirmation transaction.
    async fn broadcast_zc(&self, tx: Transaction) -> Result<Txid, ChainError>;
}
