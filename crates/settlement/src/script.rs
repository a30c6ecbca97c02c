//! Settlement script construction, address conversion and reverse parsing.

use bitcoin::{
    hashes::Hash,
    opcodes::all::{OP_CHECKMULTISIG, OP_PUSHNUM_1, OP_PUSHNUM_16},
    script::Instruction,
    secp256k1::PublicKey,
    Address, Network, Script, ScriptBuf, WScriptHash,
};

use crate::{asset::MultisigAsset, ScriptError};

/// Builds the 1-of-2 settlement witness script, buyer key first.
///
/// Key order is part of the protocol: swapping the arguments yields a different address.
pub fn build_settlement_script(buyer: &PublicKey, seller: &PublicKey) -> ScriptBuf {
    MultisigAsset::settlement(*buyer, *seller).witness_script()
}

/// P2WSH address committing to `witness_script`.
pub fn script_to_address(witness_script: &Script, network: Network) -> Address {
    Address::p2wsh(witness_script, network)
}

/// P2WSH output script committing to `witness_script`.
pub fn p2wsh_script_pubkey(witness_script: &Script) -> ScriptBuf {
    ScriptBuf::new_p2wsh(&WScriptHash::hash(witness_script.as_bytes()))
}

/// A settlement witness script together with the keys it commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementScript {
    buyer: PublicKey,
    seller: PublicKey,
    witness_script: ScriptBuf,
}

impl SettlementScript {
    pub fn new(buyer: PublicKey, seller: PublicKey) -> Self {
        Self {
            witness_script: build_settlement_script(&buyer, &seller),
            buyer,
            seller,
        }
    }

    /// Recovers the buyer and seller keys from a 1-of-2 settlement witness script.
    pub fn from_witness_script(script: &Script) -> Result<Self, ScriptError> {
        let (required, keys) = parse_multisig(script)?;
        match (required, keys.as_slice()) {
            (1, [buyer, seller]) => Ok(Self::new(*buyer, *seller)),
            _ => Err(ScriptError::NotMultisig),
        }
    }

    pub fn buyer(&self) -> &PublicKey {
        &self.buyer
    }

    pub fn seller(&self) -> &PublicKey {
        &self.seller
    }

    pub fn witness_script(&self) -> &Script {
        &self.witness_script
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        p2wsh_script_pubkey(&self.witness_script)
    }

    pub fn address(&self, network: Network) -> Address {
        script_to_address(&self.witness_script, network)
    }
}

/// Parses `OP_m <key>... OP_n OP_CHECKMULTISIG`, returning `m` and the keys in script order.
pub fn parse_multisig(script: &Script) -> Result<(usize, Vec<PublicKey>), ScriptError> {
    let instructions = script.instructions().collect::<Result<Vec<_>, _>>()?;

    let [Instruction::Op(first), middle @ .., Instruction::Op(last_n), Instruction::Op(check)] =
        instructions.as_slice()
    else {
        return Err(ScriptError::NotMultisig);
    };
    if *check != OP_CHECKMULTISIG {
        return Err(ScriptError::NotMultisig);
    }
    let required = small_int(first.to_u8()).ok_or(ScriptError::NotMultisig)?;
    let total = small_int(last_n.to_u8()).ok_or(ScriptError::NotMultisig)?;

    let mut keys = Vec::with_capacity(middle.len());
    for ins in middle {
        match ins {
            Instruction::PushBytes(bytes) if bytes.len() == 33 => {
                keys.push(PublicKey::from_slice(bytes.as_bytes())?);
            }
            _ => return Err(ScriptError::NotMultisig),
        }
    }

    if keys.len() != total || required > total {
        return Err(ScriptError::NotMultisig);
    }
    Ok((required, keys))
}

fn small_int(op: u8) -> Option<usize> {
    (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8())
        .contains(&op)
        .then(|| (op - OP_PUSHNUM_1.to_u8() + 1) as usize)
}

#[cfg(test)]
mod tests {
    use bitcoin::{opcodes::all::OP_CHECKSIG, script::Builder};
    use bs_test_utils_btc::{TestKey, BUYER_SEED, SELLER_SEED};

    use super::*;

    #[test]
    fn test_roundtrip_through_witness_script() {
        let buyer = TestKey::from_seed(BUYER_SEED).public;
        let seller = TestKey::from_seed(SELLER_SEED).public;
        let script = SettlementScript::new(buyer, seller);

        let parsed = SettlementScript::from_witness_script(script.witness_script()).unwrap();
        assert_eq!(parsed, script);
        assert_eq!(parsed.buyer(), &buyer);
        assert_eq!(
            parsed.address(Network::Regtest),
            script_to_address(&build_settlement_script(&buyer, &seller), Network::Regtest)
        );
    }

    #[test]
    fn test_address_matches_script_pubkey() {
        let buyer = TestKey::from_seed(BUYER_SEED).public;
        let seller = TestKey::from_seed(SELLER_SEED).public;
        let script = SettlementScript::new(buyer, seller);
        assert_eq!(
            script.address(Network::Bitcoin).script_pubkey(),
            script.script_pubkey()
        );
        assert!(script.address(Network::Bitcoin).to_string().starts_with("bc1q"));
    }

    #[test]
    fn test_key_order_matters() {
        let a = TestKey::from_seed(BUYER_SEED).public;
        let b = TestKey::from_seed(SELLER_SEED).public;
        assert_ne!(build_settlement_script(&a, &b), build_settlement_script(&b, &a));
    }

    #[test]
    fn test_rejects_non_multisig() {
        let key = TestKey::from_seed(BUYER_SEED).public;
        let p2pk = Builder::new()
            .push_key(&bitcoin::PublicKey::new(key))
            .push_opcode(OP_CHECKSIG)
            .into_script();
        assert_eq!(
            SettlementScript::from_witness_script(&p2pk),
            Err(ScriptError::NotMultisig)
        );
    }

    #[test]
    fn test_rejects_mismatched_key_count() {
        let key = TestKey::from_seed(BUYER_SEED).public;
        let script = Builder::new()
            .push_int(1)
            .push_key(&bitcoin::PublicKey::new(key))
            .push_int(2)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script();
        assert_eq!(parse_multisig(&script), Err(ScriptError::NotMultisig));
    }

    #[test]
    fn test_rejects_two_of_two() {
        let a = TestKey::from_seed(BUYER_SEED).public;
        let b = TestKey::from_seed(SELLER_SEED).public;
        let script = Builder::new()
            .push_int(2)
            .push_key(&bitcoin::PublicKey::new(a))
            .push_key(&bitcoin::PublicKey::new(b))
            .push_int(2)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script();
        assert_eq!(parse_multisig(&script).unwrap().0, 2);
        assert!(SettlementScript::from_witness_script(&script).is_err());
    }
}
