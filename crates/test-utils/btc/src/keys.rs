use bitcoin::{
    hashes::Hash,
    secp256k1::{PublicKey, SecretKey, SECP256K1},
    Address, CompressedPublicKey, Network, ScriptBuf, ScriptHash, WPubkeyHash,
};
use bs_primitives::{AuthKey, SettlementId};

/// Seed of the buyer's auth key in scenario tests.
pub const BUYER_SEED: u8 = 0x21;

/// Seed of the seller's auth key in scenario tests.
pub const SELLER_SEED: u8 = 0x42;

/// Seed of the ordinary wallet key funding pay-ins.
pub const WALLET_SEED: u8 = 0x63;

/// Settlement id `0x11…11` used across the scenario tests.
pub fn scenario_settlement_id() -> SettlementId {
    SettlementId::new([0x11; 32])
}

/// A deterministic keypair.
#[derive(Debug, Clone, Copy)]
pub struct TestKey {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl TestKey {
    /// Builds a key whose secret is `seed` repeated 32 times.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is zero or `0xff`, which don't give a valid secret.
    pub fn from_seed(seed: u8) -> Self {
        let secret = SecretKey::from_slice(&[seed; 32]).expect("test: valid seed");
        let public = PublicKey::from_secret_key(SECP256K1, &secret);
        Self { secret, public }
    }

    pub fn auth_key(&self) -> AuthKey {
        AuthKey::new(self.public)
    }

    pub fn wpubkey_hash(&self) -> WPubkeyHash {
        WPubkeyHash::hash(&self.public.serialize())
    }

    /// Native segwit output script paying to this key.
    pub fn p2wpkh_script(&self) -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&self.wpubkey_hash())
    }

    /// The witness program that a nested segwit output commits to.
    pub fn nested_redeem_script(&self) -> ScriptBuf {
        self.p2wpkh_script()
    }

    /// Nested segwit output script paying to this key.
    pub fn p2sh_p2wpkh_script(&self) -> ScriptBuf {
        ScriptBuf::new_p2sh(&ScriptHash::hash(self.nested_redeem_script().as_bytes()))
    }

    pub fn p2wpkh_address(&self, network: Network) -> Address {
        Address::p2wpkh(&CompressedPublicKey(self.public), network)
    }
}
