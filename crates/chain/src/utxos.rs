use std::collections::{BTreeMap, BTreeSet};

use bitcoin::Transaction;
use bs_settlement::Utxo;
use tracing::debug;

use crate::{BlockchainQuery, ChainError, MonitorError};

/// Fetches the outputs `tx` spends.
///
/// Each supporting transaction is requested once, and returned transactions are matched by
/// their computed txid rather than by response order.
pub async fn collect_prev_utxos(
    query: &impl BlockchainQuery,
    tx: &Transaction,
) -> Result<Vec<Utxo>, MonitorError> {
    let txids: BTreeSet<_> = tx.input.iter().map(|txin| txin.previous_output.txid).collect();
    debug!(count = txids.len(), txid = %tx.compute_txid(), "fetching supporting transactions");

    let supporting: BTreeMap<_, _> = query
        .get_txs_by_hash(txids.into_iter().collect())
        .await?
        .into_iter()
        .map(|prev| (prev.compute_txid(), prev))
        .collect();

    tx.input
        .iter()
        .map(|txin| {
            let outpoint = txin.previous_output;
            let prev = supporting
                .get(&outpoint.txid)
                .ok_or(ChainError::TxNotFound(outpoint.txid))?;
            Utxo::from_tx(prev, outpoint.vout).ok_or(MonitorError::MissingOutput(outpoint))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bitcoin::{OutPoint, Sequence};
    use bs_test_utils_btc::{create_funding_tx, create_spending_tx, txout, TestKey, WALLET_SEED};

    use super::*;
    use crate::MockBlockchainQuery;

    #[tokio::test]
    async fn test_collects_each_txid_once() {
        let key = TestKey::from_seed(WALLET_SEED);
        let funding = create_funding_tx(
            0,
            vec![
                txout(1_000, key.p2wpkh_script()),
                txout(2_000, key.p2wpkh_script()),
            ],
        );
        let txid = funding.compute_txid();
        let tx = create_spending_tx(
            &[OutPoint::new(txid, 1), OutPoint::new(txid, 0)],
            vec![],
            Sequence::MAX,
        );

        let mut query = MockBlockchainQuery::new();
        let returned = funding.clone();
        query
            .expect_get_txs_by_hash()
            .times(1)
            .withf(move |txids| txids == &vec![txid])
            .returning(move |_| Ok(vec![returned.clone()]));

        let utxos = collect_prev_utxos(&query, &tx).await.unwrap();
        assert_eq!(utxos.len(), 2);
        assert_eq!(utxos[0].value.to_sat(), 2_000);
        assert_eq!(utxos[1].outpoint, OutPoint::new(txid, 0));
    }

    #[tokio::test]
    async fn test_missing_supporting_tx() {
        let key = TestKey::from_seed(WALLET_SEED);
        let funding = create_funding_tx(0, vec![txout(1_000, key.p2wpkh_script())]);
        let txid = funding.compute_txid();
        let tx = create_spending_tx(&[OutPoint::new(txid, 0)], vec![], Sequence::MAX);

        let mut query = MockBlockchainQuery::new();
        query.expect_get_txs_by_hash().returning(|_| Ok(vec![]));

        assert_eq!(
            collect_prev_utxos(&query, &tx).await,
            Err(MonitorError::Chain(ChainError::TxNotFound(txid)))
        );
    }

    #[tokio::test]
    async fn test_missing_output_index() {
        let key = TestKey::from_seed(WALLET_SEED);
        let funding = create_funding_tx(0, vec![txout(1_000, key.p2wpkh_script())]);
        let outpoint = OutPoint::new(funding.compute_txid(), 4);
        let tx = create_spending_tx(&[outpoint], vec![], Sequence::MAX);

        let mut query = MockBlockchainQuery::new();
        query
            .expect_get_txs_by_hash()
            .returning(move |_| Ok(vec![funding.clone()]));

        assert_eq!(
            collect_prev_utxos(&query, &tx).await,
            Err(MonitorError::MissingOutput(outpoint))
        );
    }

    #[tokio::test]
    async fn test_query_error_propagates() {
        let tx = create_spending_tx(&[OutPoint::null()], vec![], Sequence::MAX);
        let mut query = MockBlockchainQuery::new();
        query
            .expect_get_txs_by_hash()
            .returning(|_| Err(ChainError::Network("timeout".to_owned())));

        assert!(matches!(
            collect_prev_utxos(&query, &tx).await,
            Err(MonitorError::Chain(ChainError::Network(_)))
        ));
    }
}
