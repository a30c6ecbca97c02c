//! Per-trade key salting and settlement address derivation.
//!
//! Salting multiplies a key by the settlement id read as a big-endian curve scalar. Both
//! counterparties can do it for each other's auth keys, while only the owner of an auth key can
//! salt the matching secret.

use bitcoin::{
    secp256k1::{PublicKey, Scalar, SecretKey, SECP256K1},
    Address, Network, Script, ScriptBuf,
};
use bs_primitives::{AuthKey, Side, SettlementId};
use tracing::debug;

use crate::{script::SettlementScript, DeriveError};

fn settlement_scalar(id: &SettlementId) -> Result<Scalar, DeriveError> {
    if id.as_bytes().iter().all(|b| *b == 0) {
        return Err(DeriveError::InvalidSettlementId);
    }
    Scalar::from_be_bytes(*id.as_bytes()).map_err(|_| DeriveError::InvalidSettlementId)
}

/// Multiplies `pubkey` by the settlement id.
pub fn salt_key(pubkey: &PublicKey, id: &SettlementId) -> Result<PublicKey, DeriveError> {
    let scalar = settlement_scalar(id)?;
    pubkey
        .mul_tweak(SECP256K1, &scalar)
        .map_err(DeriveError::Tweak)
}

/// Multiplies `secret` by the settlement id, giving the secret of [`salt_key`]'s result.
pub fn salt_secret_key(secret: &SecretKey, id: &SettlementId) -> Result<SecretKey, DeriveError> {
    let scalar = settlement_scalar(id)?;
    secret.mul_tweak(&scalar).map_err(DeriveError::Tweak)
}

/// Both counterparties' salted keys for one trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaltedKeys {
    pub buyer: PublicKey,
    pub seller: PublicKey,
}

impl SaltedKeys {
    pub fn derive(
        id: &SettlementId,
        buyer: &AuthKey,
        seller: &AuthKey,
    ) -> Result<Self, DeriveError> {
        Ok(Self {
            buyer: salt_key(buyer.inner(), id)?,
            seller: salt_key(seller.inner(), id)?,
        })
    }

    pub fn get(&self, side: Side) -> &PublicKey {
        match side {
            Side::Buyer => &self.buyer,
            Side::Seller => &self.seller,
        }
    }

    /// Which side, if any, `key` belongs to.
    pub fn side_of(&self, key: &PublicKey) -> Option<Side> {
        if key == &self.buyer {
            Some(Side::Buyer)
        } else if key == &self.seller {
            Some(Side::Seller)
        } else {
            None
        }
    }
}

/// Everything derived for one trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    id: SettlementId,
    buyer: AuthKey,
    seller: AuthKey,
    salted: SaltedKeys,
    script: SettlementScript,
    address: Address,
}

impl Settlement {
    pub fn derive(
        id: SettlementId,
        buyer: AuthKey,
        seller: AuthKey,
        network: Network,
    ) -> Result<Self, DeriveError> {
        let salted = SaltedKeys::derive(&id, &buyer, &seller)?;
        let script = SettlementScript::new(salted.buyer, salted.seller);
        let address = script.address(network);
        debug!(settlement_id = %id, %address, "derived settlement address");
        Ok(Self {
            id,
            buyer,
            seller,
            salted,
            script,
            address,
        })
    }

    pub fn id(&self) -> &SettlementId {
        &self.id
    }

    pub fn auth_key(&self, side: Side) -> &AuthKey {
        match side {
            Side::Buyer => &self.buyer,
            Side::Seller => &self.seller,
        }
    }

    pub fn salted_keys(&self) -> &SaltedKeys {
        &self.salted
    }

    pub fn witness_script(&self) -> &Script {
        self.script.witness_script()
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        self.script.script_pubkey()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Derives the settlement address for a trade.
pub fn derive_settlement_address(
    id: &SettlementId,
    buyer: &AuthKey,
    seller: &AuthKey,
    network: Network,
) -> Result<Address, DeriveError> {
    let salted = SaltedKeys::derive(id, buyer, seller)?;
    Ok(SettlementScript::new(salted.buyer, salted.seller).address(network))
}
