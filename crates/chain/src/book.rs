use std::collections::{btree_map::Entry, BTreeMap};

use bitcoin::Network;
use bs_primitives::{AuthKey, SettlementId};
use bs_settlement::Settlement;
use tracing::info;

use crate::BookError;

/// Settlements derived so far, keyed by settlement id.
///
/// Each trade is registered once; registering the same id again with the same keys returns the
/// existing entry.
#[derive(Debug, Clone)]
pub struct SettlementBook {
    network: Network,
    entries: BTreeMap<SettlementId, Settlement>,
}

impl SettlementBook {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            entries: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        id: SettlementId,
        buyer: AuthKey,
        seller: AuthKey,
    ) -> Result<&Settlement, BookError> {
        let settlement = Settlement::derive(id, buyer, seller, self.network)?;
        match self.entries.entry(id) {
            Entry::Occupied(entry) if entry.get() != &settlement => Err(BookError::Conflict(id)),
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                info!(settlement_id = %id, address = %settlement.address(), "registered settlement");
                Ok(&*entry.insert(settlement))
            }
        }
    }

    pub fn get(&self, id: &SettlementId) -> Option<&Settlement> {
        self.entries.get(id)
    }

    pub fn remove(&mut self, id: &SettlementId) -> Option<Settlement> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use bs_test_utils_btc::{scenario_settlement_id, TestKey, BUYER_SEED, SELLER_SEED, WALLET_SEED};

    use super::*;

    #[test]
    fn test_register_once() {
        let mut book = SettlementBook::new(Network::Regtest);
        let id = scenario_settlement_id();
        let buyer = TestKey::from_seed(BUYER_SEED).auth_key();
        let seller = TestKey::from_seed(SELLER_SEED).auth_key();

        let address = book.register(id, buyer, seller).unwrap().address().clone();
        let again = book.register(id, buyer, seller).unwrap();
        assert_eq!(again.address(), &address);
        assert_eq!(book.len(), 1);

        let other = TestKey::from_seed(WALLET_SEED).auth_key();
        assert_eq!(
            book.register(id, buyer, other).unwrap_err(),
            BookError::Conflict(id)
        );
        assert_eq!(book.get(&id).unwrap().address(), &address);

        assert!(book.remove(&id).is_some());
        assert!(book.is_empty());
    }

    #[test]
    fn test_invalid_id_rejected() {
        let mut book = SettlementBook::new(Network::Regtest);
        let res = book.register(
            SettlementId::new([0; 32]),
            TestKey::from_seed(BUYER_SEED).auth_key(),
            TestKey::from_seed(SELLER_SEED).auth_key(),
        );
        assert!(matches!(res, Err(BookError::Derive(_))));
    }
}
