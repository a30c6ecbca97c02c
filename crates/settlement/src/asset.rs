//! Closed set of asset kinds a settlement wallet leaf can hold.

use std::{collections::BTreeMap, fmt};

use bitcoin::{
    hashes::Hash, opcodes::all::OP_CHECKMULTISIG, script::Builder, secp256k1::PublicKey,
    ScriptBuf, WPubkeyHash, WScriptHash,
};
use bs_primitives::Side;

use crate::DeriveError;

/// Largest key count `OP_CHECKMULTISIG` accepts through small-integer pushes.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// Position of a key inside a multisig asset.
///
/// Members are serialized in tag order, so both counterparties must agree on the tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyTag(u8);

impl KeyTag {
    pub const BUYER: Self = Self(0x00);
    pub const SELLER: Self = Self(0x01);

    pub const fn new(tag: u8) -> Self {
        Self(tag)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<Side> for KeyTag {
    fn from(side: Side) -> Self {
        Self(side.key_tag())
    }
}

impl fmt::Display for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// An m-of-n multisig asset whose members are ordered by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigAsset {
    required: usize,
    keys: BTreeMap<KeyTag, PublicKey>,
}

impl MultisigAsset {
    pub fn new(required: usize, keys: BTreeMap<KeyTag, PublicKey>) -> Result<Self, DeriveError> {
        let total = keys.len();
        if required == 0 || required > total || total > MAX_MULTISIG_KEYS {
            return Err(DeriveError::InvalidMultisig { required, total });
        }
        Ok(Self { required, keys })
    }

    /// The 1-of-2 asset locking a trade's collateral, buyer first.
    pub fn settlement(buyer: PublicKey, seller: PublicKey) -> Self {
        Self {
            required: 1,
            keys: BTreeMap::from([(KeyTag::BUYER, buyer), (KeyTag::SELLER, seller)]),
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn key(&self, tag: KeyTag) -> Option<&PublicKey> {
        self.keys.get(&tag)
    }

    /// Member keys in tag order.
    pub fn keys(&self) -> impl Iterator<Item = &PublicKey> + '_ {
        self.keys.values()
    }

    /// `OP_m <key>... OP_n OP_CHECKMULTISIG`.
    pub fn witness_script(&self) -> ScriptBuf {
        let mut builder = Builder::new().push_int(self.required as i64);
        for key in self.keys.values() {
            builder = builder.push_key(&bitcoin::PublicKey::new(*key));
        }
        builder
            .push_int(self.keys.len() as i64)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script()
    }
}

/// A wallet asset entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEntry {
    /// A single key, spent through P2WPKH.
    Single(PublicKey),

    /// A multisig, spent through P2WSH.
    Multisig(MultisigAsset),
}

impl AssetEntry {
    /// Output script locking funds to this asset.
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self {
            Self::Single(key) => ScriptBuf::new_p2wpkh(&WPubkeyHash::hash(&key.serialize())),
            Self::Multisig(ms) => ScriptBuf::new_p2wsh(&WScriptHash::hash(ms.witness_script().as_bytes())),
        }
    }

    /// The script revealed in the witness when spending, if the asset has one.
    pub fn witness_script(&self) -> Option<ScriptBuf> {
        match self {
            Self::Single(_) => None,
            Self::Multisig(ms) => Some(ms.witness_script()),
        }
    }

    pub fn public_keys(&self) -> Vec<PublicKey> {
        match self {
            Self::Single(key) => vec![*key],
            Self::Multisig(ms) => ms.keys().copied().collect(),
        }
    }
}
