use std::collections::BTreeMap;

use bitcoin::{Amount, OutPoint, ScriptBuf, Transaction, TxOut};
use serde::{Deserialize, Serialize};

/// Previous outputs keyed by the outpoint that spends them.
pub type PrevoutMap = BTreeMap<OutPoint, TxOut>;

/// An unspent output a transaction spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
    pub script_pubkey: ScriptBuf,
}

impl Utxo {
    pub fn new(outpoint: OutPoint, value: Amount, script_pubkey: ScriptBuf) -> Self {
        Self {
            outpoint,
            value,
            script_pubkey,
        }
    }

    /// Output `vout` of `tx`, if it exists.
    pub fn from_tx(tx: &Transaction, vout: u32) -> Option<Self> {
        let out = tx.output.get(vout as usize)?;
        Some(Self::new(
            OutPoint::new(tx.compute_txid(), vout),
            out.value,
            out.script_pubkey.clone(),
        ))
    }

    pub fn txout(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}

/// Indexes `utxos` by outpoint.
pub fn prevout_map<'a>(utxos: impl IntoIterator<Item = &'a Utxo>) -> PrevoutMap {
    utxos
        .into_iter()
        .map(|utxo| (utxo.outpoint, utxo.txout()))
        .collect()
}

#[cfg(test)]
mod tests {
    use bs_test_utils_btc::{create_funding_tx, txout, TestKey, WALLET_SEED};

    use super::*;

    #[test]
    fn test_from_tx() {
        let key = TestKey::from_seed(WALLET_SEED);
        let funding = create_funding_tx(0, vec![txout(5_000, key.p2wpkh_script())]);
        let utxo = Utxo::from_tx(&funding, 0).unwrap();
        assert_eq!(utxo.outpoint, OutPoint::new(funding.compute_txid(), 0));
        assert_eq!(utxo.value, Amount::from_sat(5_000));
        assert!(Utxo::from_tx(&funding, 1).is_none());

        let map = prevout_map([&utxo]);
        assert_eq!(map.get(&utxo.outpoint), Some(&funding.output[0]));
    }

    #[test]
    fn test_serde_uses_sats() {
        let key = TestKey::from_seed(WALLET_SEED);
        let funding = create_funding_tx(1, vec![txout(42, key.p2wpkh_script())]);
        let utxo = Utxo::from_tx(&funding, 0).unwrap();
        let json = serde_json::to_value(&utxo).unwrap();
        assert_eq!(json["value"], 42);
        let back: Utxo = serde_json::from_value(json).unwrap();
        assert_eq!(back, utxo);
    }
}
