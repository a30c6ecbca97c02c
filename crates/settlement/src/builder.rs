//! Pay-out construction: the settlement UTXO, the unsigned spend and its signature.

use bitcoin::{
    absolute::LockTime,
    ecdsa,
    hashes::Hash,
    secp256k1::{self, Message, PublicKey, SecretKey, SECP256K1},
    sighash::{EcdsaSighashType, SighashCache},
    transaction::Version,
    Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};

use crate::{derive::Settlement, fee::fee_for_vsize, utxo::Utxo, BuildError, SettlementPolicy};

/// Signing seam between the settlement core and whatever holds the salted secret.
pub trait SettlementSigner {
    fn public_key(&self) -> PublicKey;

    fn sign_ecdsa(&self, msg: &Message) -> Result<secp256k1::ecdsa::Signature, BuildError>;
}

impl SettlementSigner for SecretKey {
    fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(SECP256K1, self)
    }

    fn sign_ecdsa(&self, msg: &Message) -> Result<secp256k1::ecdsa::Signature, BuildError> {
        Ok(SECP256K1.sign_ecdsa(msg, self))
    }
}

/// The pay-in output a pay-out spends: `payin_txid:0` locked to the settlement address.
pub fn settlement_utxo(settlement: &Settlement, payin_txid: Txid, amount: Amount) -> Utxo {
    Utxo::new(
        OutPoint::new(payin_txid, 0),
        amount,
        settlement.script_pubkey(),
    )
}

/// Virtual size of a signed pay-out to `recv_script`.
pub fn estimate_payout_vsize(settlement: &Settlement, recv_script: &Script) -> u64 {
    let tx = payout_tx(
        OutPoint::null(),
        TxOut {
            value: Amount::ZERO,
            script_pubkey: recv_script.to_owned(),
        },
        Witness::from_slice(&[
            Vec::new(),
            vec![0u8; 72],
            settlement.witness_script().to_bytes(),
        ]),
    );
    tx.vsize() as u64
}

/// Builds the unsigned single-input, single-output spend of the settlement UTXO.
///
/// The fee is `fee_rate` applied to the estimated signed size and comes out of the settlement
/// amount.
pub fn build_unsigned_payout(
    utxo: &Utxo,
    settlement: &Settlement,
    recv_script: ScriptBuf,
    fee_rate: f64,
) -> Result<Transaction, BuildError> {
    let fee = fee_for_vsize(fee_rate, estimate_payout_vsize(settlement, &recv_script));
    let value = utxo
        .value
        .checked_sub(fee)
        .ok_or(BuildError::AmountBelowFee {
            amount: utxo.value,
            fee,
        })?;
    Ok(payout_tx(
        utxo.outpoint,
        TxOut {
            value,
            script_pubkey: recv_script,
        },
        Witness::new(),
    ))
}

/// Signs the settlement input with `SIGHASH_ALL` and installs the multisig witness.
pub fn sign_payout<S: SettlementSigner + ?Sized>(
    tx: &mut Transaction,
    settlement: &Settlement,
    amount: Amount,
    signer: &S,
) -> Result<(), BuildError> {
    if tx.input.len() != 1 {
        return Err(BuildError::InputCount(tx.input.len()));
    }
    sign_settlement_input(tx, 0, settlement, amount, signer)
}

/// Signs input `index` of `tx` as a spend of the settlement output worth `amount`.
pub fn sign_settlement_input<S: SettlementSigner + ?Sized>(
    tx: &mut Transaction,
    index: usize,
    settlement: &Settlement,
    amount: Amount,
    signer: &S,
) -> Result<(), BuildError> {
    let sighash = SighashCache::new(&*tx)
        .p2wsh_signature_hash(index, settlement.witness_script(), amount, EcdsaSighashType::All)
        .map_err(|e| BuildError::Sighash(e.to_string()))?;
    let signature = signer.sign_ecdsa(&Message::from_digest(sighash.to_byte_array()))?;
    let sig = ecdsa::Signature {
        signature,
        sighash_type: EcdsaSighashType::All,
    };
    tx.input[index].witness = Witness::from_slice(&[
        Vec::new(),
        sig.to_vec(),
        settlement.witness_script().to_bytes(),
    ]);
    Ok(())
}

/// Smallest trade amount whose pay-out still leaves a non-dust output at `fee_rate`.
pub fn min_trade_amount(fee_rate: f64, policy: &SettlementPolicy) -> Result<Amount, BuildError> {
    let payout_fee = (fee_rate * policy.payout_max_vsize as f64).round() as u64;
    Amount::from_sat(payout_fee)
        .checked_add(policy.nested_segwit_dust())
        .filter(|amount| *amount <= Amount::MAX_MONEY)
        .ok_or_else(|| BuildError::FeeOutOfRange(fee_rate.to_string()))
}

fn payout_tx(outpoint: OutPoint, output: TxOut, witness: Witness) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness,
        }],
        output: vec![output],
    }
}
