//! Script verification of signed inputs against their previous outputs.
//!
//! Covers the script types settlement transactions can spend: P2PKH, P2WPKH, P2WSH multisig and
//! their P2SH-nested forms. Besides a pass/fail verdict it reports, per input, which of the keys
//! committed to by the spent script produced a valid signature; that is what signer attribution
//! is built on.

use std::{collections::BTreeMap, ops::BitOr};

use bitcoin::{
    ecdsa,
    hashes::Hash,
    script::{Instruction, PushBytes},
    secp256k1::{Message, PublicKey, SECP256K1},
    sighash::SighashCache,
    Amount, Script, ScriptBuf, ScriptHash, Transaction, TxIn, TxOut, WPubkeyHash, Witness,
};

use crate::{
    script::{p2wsh_script_pubkey, parse_multisig},
    utxo::PrevoutMap,
    VerifyError,
};

/// Script features a verification accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyFlags(u32);

impl VerifyFlags {
    pub const NONE: Self = Self(0);

    /// Evaluate P2SH redeem scripts.
    pub const P2SH: Self = Self(1 << 0);

    /// Evaluate segwit v0 witness programs.
    pub const SEGWIT: Self = Self(1 << 1);

    /// Evaluate P2WSH programs nested in P2SH.
    pub const P2SH_SHA256: Self = Self(1 << 2);

    pub const STANDARD: Self = Self(Self::P2SH.0 | Self::SEGWIT.0 | Self::P2SH_SHA256.0);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for VerifyFlags {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BitOr for VerifyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What an input's signatures prove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInputState {
    /// Signatures needed to spend.
    pub required: usize,

    /// Keys committed to by the spent script, in script order.
    pub keys: Vec<PublicKey>,

    /// Non-empty signatures present, valid or not.
    pub signature_count: usize,

    /// Keys that produced a valid signature.
    pub signers: Vec<PublicKey>,
}

impl SignedInputState {
    fn new(required: usize, keys: Vec<PublicKey>) -> Self {
        Self {
            required,
            keys,
            signature_count: 0,
            signers: Vec::new(),
        }
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signers.len() >= self.required
    }

    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.signers.contains(key)
    }
}

/// Per-input signed state of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierState {
    inputs: BTreeMap<usize, SignedInputState>,
}

impl VerifierState {
    /// State of `input`, `None` if it was skipped.
    pub fn get(&self, input: usize) -> Option<&SignedInputState> {
        self.inputs.get(&input)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SignedInputState)> + '_ {
        self.inputs.iter().map(|(i, s)| (*i, s))
    }
}

type Cache<'a> = SighashCache<&'a Transaction>;

/// Verifies a transaction's inputs against a previous-output map.
#[derive(Debug)]
pub struct TransactionVerifier<'a> {
    tx: &'a Transaction,
    prevouts: &'a PrevoutMap,
    flags: VerifyFlags,
}

impl<'a> TransactionVerifier<'a> {
    pub fn new(tx: &'a Transaction, prevouts: &'a PrevoutMap, flags: VerifyFlags) -> Self {
        Self {
            tx,
            prevouts,
            flags,
        }
    }

    /// Evaluates the signed state of every input.
    ///
    /// In strict mode an input with an unknown previous output is an error, otherwise it is
    /// skipped and absent from the returned state.
    pub fn evaluate_state(&self, strict: bool) -> Result<VerifierState, VerifyError> {
        let mut cache = SighashCache::new(self.tx);
        let mut state = VerifierState::default();
        for (index, txin) in self.tx.input.iter().enumerate() {
            let Some(prevout) = self.prevouts.get(&txin.previous_output) else {
                if strict {
                    return Err(VerifyError::MissingPrevout {
                        input: index,
                        outpoint: txin.previous_output,
                    });
                }
                continue;
            };
            let input_state = self.evaluate(&mut cache, index, txin, prevout)?;
            state.inputs.insert(index, input_state);
        }
        Ok(state)
    }

    /// Evaluates the signed state of a single input.
    pub fn evaluate_input(&self, index: usize) -> Result<SignedInputState, VerifyError> {
        let txin = self
            .tx
            .input
            .get(index)
            .ok_or(VerifyError::InputIndex(index))?;
        let prevout =
            self.prevouts
                .get(&txin.previous_output)
                .ok_or(VerifyError::MissingPrevout {
                    input: index,
                    outpoint: txin.previous_output,
                })?;
        self.evaluate(&mut SighashCache::new(self.tx), index, txin, prevout)
    }

    /// Demands every input be fully signed and the spent value cover the outputs.
    pub fn verify(&self) -> Result<(), VerifyError> {
        let state = self.evaluate_state(true)?;
        for input in 0..self.tx.input.len() {
            if !state.get(input).is_some_and(SignedInputState::is_fully_signed) {
                return Err(VerifyError::IncompleteSignatures { input });
            }
        }

        let inputs = self
            .tx
            .input
            .iter()
            .filter_map(|txin| self.prevouts.get(&txin.previous_output))
            .try_fold(Amount::ZERO, |acc, out| acc.checked_add(out.value))
            .ok_or(VerifyError::ValueOverflow)?;
        let outputs = self
            .tx
            .output
            .iter()
            .try_fold(Amount::ZERO, |acc, out| acc.checked_add(out.value))
            .ok_or(VerifyError::ValueOverflow)?;
        if inputs < outputs {
            return Err(VerifyError::InsufficientInputValue { inputs, outputs });
        }
        Ok(())
    }

    fn require(&self, input: usize, flag: VerifyFlags, name: &'static str) -> Result<(), VerifyError> {
        if self.flags.contains(flag) {
            Ok(())
        } else {
            Err(VerifyError::FlagNotSet { input, flag: name })
        }
    }

    fn evaluate(
        &self,
        cache: &mut Cache<'a>,
        index: usize,
        txin: &TxIn,
        prevout: &TxOut,
    ) -> Result<SignedInputState, VerifyError> {
        let spk = prevout.script_pubkey.as_script();
        let value = prevout.value;

        if spk.is_p2wpkh() || spk.is_p2wsh() {
            self.require(index, VerifyFlags::SEGWIT, "SEGWIT")?;
            if !txin.script_sig.is_empty() {
                return Err(VerifyError::MalformedScriptSig { input: index });
            }
            return if spk.is_p2wpkh() {
                eval_wpkh(cache, index, spk, &txin.witness, value)
            } else {
                eval_wsh(cache, index, spk, &txin.witness, value)
            };
        }

        if spk.is_p2sh() {
            self.require(index, VerifyFlags::P2SH, "P2SH")?;
            let redeem = single_push(&txin.script_sig)
                .map(|push| Script::from_bytes(push.as_bytes()))
                .ok_or(VerifyError::MalformedScriptSig { input: index })?;
            if ScriptBuf::new_p2sh(&ScriptHash::hash(redeem.as_bytes())).as_script() != spk {
                return Err(VerifyError::ScriptHashMismatch { input: index });
            }
            if redeem.is_p2wpkh() {
                self.require(index, VerifyFlags::SEGWIT, "SEGWIT")?;
                return eval_wpkh(cache, index, redeem, &txin.witness, value);
            }
            if redeem.is_p2wsh() {
                self.require(index, VerifyFlags::SEGWIT, "SEGWIT")?;
                self.require(index, VerifyFlags::P2SH_SHA256, "P2SH_SHA256")?;
                return eval_wsh(cache, index, redeem, &txin.witness, value);
            }
            return Err(VerifyError::UnsupportedScript { input: index });
        }

        if spk.is_p2pkh() {
            return eval_pkh(cache, index, spk, txin);
        }

        Err(VerifyError::UnsupportedScript { input: index })
    }
}

fn eval_wpkh(
    cache: &mut Cache<'_>,
    input: usize,
    program: &Script,
    witness: &Witness,
    value: Amount,
) -> Result<SignedInputState, VerifyError> {
    let (2, Some(sig_bytes), Some(key_bytes)) = (witness.len(), witness.nth(0), witness.nth(1))
    else {
        return Err(VerifyError::MalformedWitness {
            input,
            reason: "expected signature and pubkey",
        });
    };
    let key = PublicKey::from_slice(key_bytes).map_err(|_| VerifyError::MalformedWitness {
        input,
        reason: "invalid pubkey",
    })?;
    if ScriptBuf::new_p2wpkh(&WPubkeyHash::hash(&key.serialize())).as_script() != program {
        return Err(VerifyError::ScriptHashMismatch { input });
    }

    let mut state = SignedInputState::new(1, vec![key]);
    if sig_bytes.is_empty() {
        return Ok(state);
    }
    let sig = parse_signature(sig_bytes).ok_or(VerifyError::MalformedWitness {
        input,
        reason: "invalid signature",
    })?;
    state.signature_count = 1;

    let sighash = cache
        .p2wpkh_signature_hash(input, program, value, sig.sighash_type)
        .map_err(|e| VerifyError::Sighash {
            input,
            reason: e.to_string(),
        })?;
    if check_signature(&Message::from_digest(sighash.to_byte_array()), &sig, &key) {
        state.signers.push(key);
    }
    Ok(state)
}

fn eval_wsh(
    cache: &mut Cache<'_>,
    input: usize,
    program: &Script,
    witness: &Witness,
    value: Amount,
) -> Result<SignedInputState, VerifyError> {
    let items: Vec<&[u8]> = witness.iter().collect();
    let Some((script_bytes, stack)) = items.split_last() else {
        return Err(VerifyError::MalformedWitness {
            input,
            reason: "empty witness",
        });
    };
    let witness_script = Script::from_bytes(script_bytes);
    if p2wsh_script_pubkey(witness_script).as_script() != program {
        return Err(VerifyError::ScriptHashMismatch { input });
    }
    let (required, keys) =
        parse_multisig(witness_script).map_err(|_| VerifyError::UnsupportedScript { input })?;

    // OP_CHECKMULTISIG pops one extra element which must be empty.
    let Some((dummy, sigs)) = stack.split_first() else {
        return Err(VerifyError::MalformedWitness {
            input,
            reason: "missing multisig dummy",
        });
    };
    if !dummy.is_empty() {
        return Err(VerifyError::MalformedWitness {
            input,
            reason: "non-empty multisig dummy",
        });
    }

    // An input nobody has signed yet carries no signature slots at all.
    if !sigs.is_empty() && sigs.len() != required {
        return Err(VerifyError::MalformedWitness {
            input,
            reason: "signature count does not match script",
        });
    }

    let mut state = SignedInputState::new(required, keys);
    // Signatures are matched against keys in script order; a key passed over is never
    // revisited.
    let mut next_key = 0;
    for sig_bytes in sigs.iter().filter(|s| !s.is_empty()) {
        let sig = parse_signature(sig_bytes).ok_or(VerifyError::MalformedWitness {
            input,
            reason: "invalid signature",
        })?;
        state.signature_count += 1;

        let sighash = cache
            .p2wsh_signature_hash(input, witness_script, value, sig.sighash_type)
            .map_err(|e| VerifyError::Sighash {
                input,
                reason: e.to_string(),
            })?;
        let msg = Message::from_digest(sighash.to_byte_array());
        let matched = state.keys[next_key..]
            .iter()
            .position(|key| check_signature(&msg, &sig, key));
        match matched {
            Some(offset) => {
                state.signers.push(state.keys[next_key + offset]);
                next_key += offset + 1;
            }
            None => next_key = state.keys.len(),
        }
    }
    Ok(state)
}

fn eval_pkh(
    cache: &mut Cache<'_>,
    input: usize,
    spk: &Script,
    txin: &TxIn,
) -> Result<SignedInputState, VerifyError> {
    if !txin.witness.is_empty() {
        return Err(VerifyError::MalformedWitness {
            input,
            reason: "unexpected witness",
        });
    }
    let malformed = || VerifyError::MalformedScriptSig { input };
    let instructions = txin
        .script_sig
        .instructions()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;
    let [Instruction::PushBytes(sig_bytes), Instruction::PushBytes(key_bytes)] =
        instructions.as_slice()
    else {
        return Err(malformed());
    };
    let key = bitcoin::PublicKey::from_slice(key_bytes.as_bytes()).map_err(|_| malformed())?;
    if ScriptBuf::new_p2pkh(&key.pubkey_hash()).as_script() != spk {
        return Err(VerifyError::ScriptHashMismatch { input });
    }

    let mut state = SignedInputState::new(1, vec![key.inner]);
    if sig_bytes.is_empty() {
        return Ok(state);
    }
    let sig = parse_signature(sig_bytes.as_bytes()).ok_or_else(malformed)?;
    state.signature_count = 1;

    let sighash = cache
        .legacy_signature_hash(input, spk, sig.sighash_type.to_u32())
        .map_err(|e| VerifyError::Sighash {
            input,
            reason: e.to_string(),
        })?;
    if check_signature(&Message::from_digest(sighash.to_byte_array()), &sig, &key.inner) {
        state.signers.push(key.inner);
    }
    Ok(state)
}

fn single_push(script: &Script) -> Option<&PushBytes> {
    let mut instructions = script.instructions();
    match (instructions.next(), instructions.next()) {
        (Some(Ok(Instruction::PushBytes(push))), None) => Some(push),
        _ => None,
    }
}

fn parse_signature(bytes: &[u8]) -> Option<ecdsa::Signature> {
    ecdsa::Signature::from_slice(bytes).ok()
}

/// Checks `sig` under `key`, accepting high-S encodings.
fn check_signature(msg: &Message, sig: &ecdsa::Signature, key: &PublicKey) -> bool {
    let mut signature = sig.signature;
    signature.normalize_s();
    SECP256K1.verify_ecdsa(msg, &signature, key).is_ok()
}

#[cfg(test)]
mod tests {
    use bitcoin::{sighash::EcdsaSighashType, OutPoint, Sequence};
    use bs_test_utils_btc::{
        create_funding_tx, create_spending_tx, sign_p2sh_p2wpkh_input, sign_p2wpkh_input, txout,
        TestKey, BUYER_SEED, SELLER_SEED, WALLET_SEED,
    };

    use super::*;
    use crate::{
        asset::{KeyTag, MultisigAsset},
        script::SettlementScript,
    };

    fn funded(value: u64, spk: ScriptBuf) -> (OutPoint, PrevoutMap) {
        let funding = create_funding_tx(7, vec![txout(value, spk)]);
        let outpoint = OutPoint::new(funding.compute_txid(), 0);
        (outpoint, PrevoutMap::from([(outpoint, funding.output[0].clone())]))
    }

    fn multisig_sig(
        tx: &Transaction,
        witness_script: &Script,
        value: Amount,
        signer: &TestKey,
    ) -> Vec<u8> {
        let sighash = SighashCache::new(tx)
            .p2wsh_signature_hash(0, witness_script, value, EcdsaSighashType::All)
            .unwrap();
        ecdsa::Signature {
            signature: SECP256K1
                .sign_ecdsa(&Message::from_digest(sighash.to_byte_array()), &signer.secret),
            sighash_type: EcdsaSighashType::All,
        }
        .to_vec()
    }

    /// Installs `[<>, sig..., witness_script]` with one signature per signer, in order.
    fn sign_multisig_with(
        tx: &mut Transaction,
        witness_script: &Script,
        value: Amount,
        signers: &[&TestKey],
    ) {
        let mut items = vec![Vec::new()];
        items.extend(
            signers
                .iter()
                .map(|signer| multisig_sig(&*tx, witness_script, value, signer)),
        );
        items.push(witness_script.to_bytes());
        tx.input[0].witness = Witness::from_slice(&items);
    }

    fn sign_multisig(
        tx: &mut Transaction,
        script: &SettlementScript,
        value: Amount,
        signer: &TestKey,
    ) {
        sign_multisig_with(tx, script.witness_script(), value, &[signer]);
    }

    fn two_of_two(buyer: &TestKey, seller: &TestKey) -> ScriptBuf {
        MultisigAsset::new(
            2,
            BTreeMap::from([(KeyTag::BUYER, buyer.public), (KeyTag::SELLER, seller.public)]),
        )
        .unwrap()
        .witness_script()
    }

    #[test]
    fn test_p2wpkh_verifies() {
        let key = TestKey::from_seed(WALLET_SEED);
        let (outpoint, prevouts) = funded(10_000, key.p2wpkh_script());
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(9_000, key.p2wpkh_script())],
            Sequence::MAX,
        );
        sign_p2wpkh_input(&mut tx, 0, &key, Amount::from_sat(10_000)).unwrap();

        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        verifier.verify().unwrap();
        let state = verifier.evaluate_input(0).unwrap();
        assert!(state.is_signed_by(&key.public));
        assert_eq!(state.signature_count, 1);
    }

    #[test]
    fn test_p2sh_p2wpkh_verifies() {
        let key = TestKey::from_seed(WALLET_SEED);
        let (outpoint, prevouts) = funded(10_000, key.p2sh_p2wpkh_script());
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(9_000, key.p2wpkh_script())],
            Sequence::MAX,
        );
        sign_p2sh_p2wpkh_input(&mut tx, 0, &key, Amount::from_sat(10_000)).unwrap();

        TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD)
            .verify()
            .unwrap();

        let err = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::SEGWIT)
            .verify()
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::FlagNotSet {
                input: 0,
                flag: "P2SH"
            }
        );
    }

    #[test]
    fn test_wrong_value_fails() {
        let key = TestKey::from_seed(WALLET_SEED);
        let (outpoint, prevouts) = funded(10_000, key.p2wpkh_script());
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(9_000, key.p2wpkh_script())],
            Sequence::MAX,
        );
        // Commits to a different prevout value than the one on chain.
        sign_p2wpkh_input(&mut tx, 0, &key, Amount::from_sat(11_000)).unwrap();

        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        assert_eq!(
            verifier.verify(),
            Err(VerifyError::IncompleteSignatures { input: 0 })
        );
        let state = verifier.evaluate_input(0).unwrap();
        assert_eq!(state.signature_count, 1);
        assert!(state.signers.is_empty());
    }

    #[test]
    fn test_foreign_key_mismatch() {
        let owner = TestKey::from_seed(WALLET_SEED);
        let thief = TestKey::from_seed(BUYER_SEED);
        let (outpoint, prevouts) = funded(10_000, owner.p2wpkh_script());
        let mut tx = create_spending_tx(&[outpoint], vec![], Sequence::MAX);
        sign_p2wpkh_input(&mut tx, 0, &thief, Amount::from_sat(10_000)).unwrap();

        assert_eq!(
            TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD).verify(),
            Err(VerifyError::ScriptHashMismatch { input: 0 })
        );
    }

    #[test]
    fn test_multisig_attribution() {
        let buyer = TestKey::from_seed(BUYER_SEED);
        let seller = TestKey::from_seed(SELLER_SEED);
        let script = SettlementScript::new(buyer.public, seller.public);
        let (outpoint, prevouts) = funded(50_000, script.script_pubkey());
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(49_000, seller.p2wpkh_script())],
            Sequence::MAX,
        );
        sign_multisig(&mut tx, &script, Amount::from_sat(50_000), &seller);

        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        verifier.verify().unwrap();
        let state = verifier.evaluate_input(0).unwrap();
        assert_eq!(state.required, 1);
        assert_eq!(state.keys, vec![buyer.public, seller.public]);
        assert!(state.is_signed_by(&seller.public));
        assert!(!state.is_signed_by(&buyer.public));
    }

    #[test]
    fn test_multisig_without_signatures() {
        let buyer = TestKey::from_seed(BUYER_SEED);
        let seller = TestKey::from_seed(SELLER_SEED);
        let script = SettlementScript::new(buyer.public, seller.public);
        let (outpoint, prevouts) = funded(50_000, script.script_pubkey());
        let mut tx = create_spending_tx(&[outpoint], vec![], Sequence::MAX);
        tx.input[0].witness =
            Witness::from_slice(&[Vec::new(), script.witness_script().to_bytes()]);

        let state = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD)
            .evaluate_input(0)
            .unwrap();
        assert_eq!(state.signature_count, 0);
        assert!(!state.is_fully_signed());
    }

    #[test]
    fn test_legacy_p2pkh() {
        let key = TestKey::from_seed(WALLET_SEED);
        let pk = bitcoin::PublicKey::new(key.public);
        let spk = ScriptBuf::new_p2pkh(&pk.pubkey_hash());
        let (outpoint, prevouts) = funded(10_000, spk.clone());
        let mut tx = create_spending_tx(&[outpoint], vec![], Sequence::MAX);

        let sighash = SighashCache::new(&tx)
            .legacy_signature_hash(0, &spk, EcdsaSighashType::All.to_u32())
            .unwrap();
        let sig = ecdsa::Signature {
            signature: SECP256K1
                .sign_ecdsa(&Message::from_digest(sighash.to_byte_array()), &key.secret),
            sighash_type: EcdsaSighashType::All,
        };
        tx.input[0].script_sig = bitcoin::script::Builder::new()
            .push_slice(bitcoin::script::PushBytesBuf::try_from(sig.to_vec()).unwrap())
            .push_key(&pk)
            .into_script();

        TransactionVerifier::new(&tx, &prevouts, VerifyFlags::NONE)
            .verify()
            .unwrap();
    }

    #[test]
    fn test_missing_prevouts() {
        let key = TestKey::from_seed(WALLET_SEED);
        let (outpoint, prevouts) = funded(10_000, key.p2wpkh_script());
        let unknown = OutPoint::new(outpoint.txid, 5);
        let mut tx = create_spending_tx(&[outpoint, unknown], vec![], Sequence::MAX);
        sign_p2wpkh_input(&mut tx, 0, &key, Amount::from_sat(10_000)).unwrap();

        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        assert_eq!(
            verifier.evaluate_state(true),
            Err(VerifyError::MissingPrevout {
                input: 1,
                outpoint: unknown
            })
        );
        let loose = verifier.evaluate_state(false).unwrap();
        assert_eq!(loose.len(), 1);
        assert!(loose.get(0).unwrap().is_fully_signed());
        assert!(loose.get(1).is_none());
    }

    #[test]
    fn test_outputs_exceed_inputs() {
        let key = TestKey::from_seed(WALLET_SEED);
        let (outpoint, prevouts) = funded(10_000, key.p2wpkh_script());
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(10_001, key.p2wpkh_script())],
            Sequence::MAX,
        );
        sign_p2wpkh_input(&mut tx, 0, &key, Amount::from_sat(10_000)).unwrap();

        assert!(matches!(
            TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD).verify(),
            Err(VerifyError::InsufficientInputValue { .. })
        ));
    }

    #[test]
    fn test_multisig_extra_signature_rejected() {
        let buyer = TestKey::from_seed(BUYER_SEED);
        let seller = TestKey::from_seed(SELLER_SEED);
        let script = SettlementScript::new(buyer.public, seller.public);
        let (outpoint, prevouts) = funded(50_000, script.script_pubkey());
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(49_000, buyer.p2wpkh_script())],
            Sequence::MAX,
        );
        sign_multisig_with(
            &mut tx,
            script.witness_script(),
            Amount::from_sat(50_000),
            &[&buyer, &seller],
        );

        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        let expected = VerifyError::MalformedWitness {
            input: 0,
            reason: "signature count does not match script",
        };
        assert_eq!(verifier.evaluate_input(0), Err(expected.clone()));
        assert_eq!(verifier.verify(), Err(expected));
    }

    #[test]
    fn test_two_of_two_signature_order() {
        let buyer = TestKey::from_seed(BUYER_SEED);
        let seller = TestKey::from_seed(SELLER_SEED);
        let witness_script = two_of_two(&buyer, &seller);
        let value = Amount::from_sat(50_000);
        let (outpoint, prevouts) = funded(50_000, p2wsh_script_pubkey(&witness_script));
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(49_000, buyer.p2wpkh_script())],
            Sequence::MAX,
        );

        sign_multisig_with(&mut tx, &witness_script, value, &[&buyer, &seller]);
        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        verifier.verify().unwrap();
        assert_eq!(
            verifier.evaluate_input(0).unwrap().signers,
            vec![buyer.public, seller.public]
        );

        // The seller's signature consumes the last key, leaving nothing for the buyer's.
        sign_multisig_with(&mut tx, &witness_script, value, &[&seller, &buyer]);
        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        let state = verifier.evaluate_input(0).unwrap();
        assert_eq!(state.signature_count, 2);
        assert_eq!(state.signers, vec![seller.public]);
        assert_eq!(
            verifier.verify(),
            Err(VerifyError::IncompleteSignatures { input: 0 })
        );

        // One signature where two are required.
        sign_multisig_with(&mut tx, &witness_script, value, &[&buyer]);
        assert!(matches!(
            TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD).evaluate_input(0),
            Err(VerifyError::MalformedWitness { .. })
        ));
    }

    #[test]
    fn test_p2sh_p2wsh_multisig() {
        let buyer = TestKey::from_seed(BUYER_SEED);
        let seller = TestKey::from_seed(SELLER_SEED);
        let script = SettlementScript::new(buyer.public, seller.public);
        let redeem = script.script_pubkey();
        let spk = ScriptBuf::new_p2sh(&ScriptHash::hash(redeem.as_bytes()));
        let (outpoint, prevouts) = funded(50_000, spk);
        let mut tx = create_spending_tx(
            &[outpoint],
            vec![txout(49_000, buyer.p2wpkh_script())],
            Sequence::MAX,
        );
        sign_multisig(&mut tx, &script, Amount::from_sat(50_000), &buyer);
        tx.input[0].script_sig = bitcoin::script::Builder::new()
            .push_slice(bitcoin::script::PushBytesBuf::try_from(redeem.to_bytes()).unwrap())
            .into_script();

        let verifier = TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD);
        verifier.verify().unwrap();
        assert!(verifier.evaluate_input(0).unwrap().is_signed_by(&buyer.public));

        assert_eq!(
            TransactionVerifier::new(&tx, &prevouts, VerifyFlags::P2SH | VerifyFlags::SEGWIT)
                .verify(),
            Err(VerifyError::FlagNotSet {
                input: 0,
                flag: "P2SH_SHA256"
            })
        );

        // The redeem script must hash to the spent P2SH program.
        let other = SettlementScript::new(seller.public, buyer.public).script_pubkey();
        tx.input[0].script_sig = bitcoin::script::Builder::new()
            .push_slice(bitcoin::script::PushBytesBuf::try_from(other.to_bytes()).unwrap())
            .into_script();
        assert_eq!(
            TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD).verify(),
            Err(VerifyError::ScriptHashMismatch { input: 0 })
        );
    }
}
