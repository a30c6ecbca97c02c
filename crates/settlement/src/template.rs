//! Unsigned pay-in template exchanged between counterparties before anything is signed.
//!
//! The template lists spenders (previous outpoints with value and locking script) and recipients.
//! It travels as borsh bytes; bitcoin types are flattened into plain wire structs for that.

use bitcoin::{
    absolute::LockTime,
    hashes::Hash,
    script::{Builder, PushBytesBuf},
    transaction::Version,
    Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use borsh::{BorshDeserialize, BorshSerialize};

use crate::{fee::fee_for_vsize, utxo::Utxo, TemplateError};

/// Placeholder sizes for witness data that doesn't exist yet.
const DUMMY_SIG_LEN: usize = 72;
const DUMMY_PUBKEY_LEN: usize = 33;

/// A previous output the pay-in spends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spender {
    pub outpoint: OutPoint,
    pub value: Amount,

    /// Locking script of the spent output, `None` until the wallet resolves it.
    pub script_pubkey: Option<ScriptBuf>,

    /// Redeem script revealed when the spent output is P2SH.
    pub redeem_script: Option<ScriptBuf>,

    pub sequence: Sequence,
}

impl Spender {
    /// A resolved spender with a final sequence.
    pub fn new(utxo: &Utxo) -> Self {
        Self {
            outpoint: utxo.outpoint,
            value: utxo.value,
            script_pubkey: Some(utxo.script_pubkey.clone()),
            redeem_script: None,
            sequence: Sequence::MAX,
        }
    }

    /// A spender whose locking script is not known yet.
    pub fn unresolved(outpoint: OutPoint, value: Amount) -> Self {
        Self {
            outpoint,
            value,
            script_pubkey: None,
            redeem_script: None,
            sequence: Sequence::MAX,
        }
    }

    pub fn with_redeem_script(mut self, redeem_script: ScriptBuf) -> Self {
        self.redeem_script = Some(redeem_script);
        self
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.script_pubkey.is_some()
    }

    fn is_wpkh(&self) -> bool {
        match (&self.script_pubkey, &self.redeem_script) {
            (Some(spk), _) if spk.is_p2wpkh() => true,
            (Some(spk), Some(redeem)) => spk.is_p2sh() && redeem.is_p2wpkh(),
            _ => false,
        }
    }

    fn script_sig(&self) -> Result<ScriptBuf, TemplateError> {
        match (&self.script_pubkey, &self.redeem_script) {
            (Some(spk), Some(redeem)) if spk.is_p2sh() => {
                let push = PushBytesBuf::try_from(redeem.to_bytes())?;
                Ok(Builder::new().push_slice(push).into_script())
            }
            _ => Ok(ScriptBuf::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayinTemplate {
    pub version: Version,
    pub lock_time: LockTime,
    pub spenders: Vec<Spender>,
    pub recipients: Vec<TxOut>,
}

impl PayinTemplate {
    pub fn new(spenders: Vec<Spender>, recipients: Vec<TxOut>) -> Self {
        Self {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            spenders,
            recipients,
        }
    }

    /// Whether every spender's locking script is known.
    pub fn is_resolved(&self) -> bool {
        !self.spenders.is_empty() && self.spenders.iter().all(Spender::is_resolved)
    }

    /// Whether any spender signals replace-by-fee.
    pub fn is_rbf(&self) -> bool {
        self.spenders.iter().any(|s| s.sequence.is_rbf())
    }

    pub fn total_input(&self) -> Result<Amount, TemplateError> {
        checked_sum(self.spenders.iter().map(|s| s.value))
    }

    pub fn total_output(&self) -> Result<Amount, TemplateError> {
        checked_sum(self.recipients.iter().map(|r| r.value))
    }

    /// Spent outputs as UTXOs, failing on the first unresolved spender.
    pub fn utxos(&self) -> Result<Vec<Utxo>, TemplateError> {
        self.spenders
            .iter()
            .enumerate()
            .map(|(index, s)| {
                let spk = s
                    .script_pubkey
                    .clone()
                    .ok_or(TemplateError::Unresolved { index })?;
                Ok(Utxo::new(s.outpoint, s.value, spk))
            })
            .collect()
    }

    /// The transaction without witnesses.
    ///
    /// Nested segwit spenders already carry their redeem script push, since it is part of the
    /// txid.
    pub fn unsigned_tx(&self) -> Result<Transaction, TemplateError> {
        let input = self
            .spenders
            .iter()
            .map(|s| {
                Ok(TxIn {
                    previous_output: s.outpoint,
                    script_sig: s.script_sig()?,
                    sequence: s.sequence,
                    witness: Witness::new(),
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Ok(Transaction {
            version: self.version,
            lock_time: self.lock_time,
            input,
            output: self.recipients.clone(),
        })
    }

    pub fn txid(&self) -> Result<Txid, TemplateError> {
        Ok(self.unsigned_tx()?.compute_txid())
    }

    /// Virtual size the transaction will have once signed.
    ///
    /// P2WPKH spenders, plain or nested, get a placeholder witness of maximal signature size.
    /// Anything else is sized as a legacy signature plus key in the script sig.
    pub fn estimate_vsize(&self) -> Result<u64, TemplateError> {
        let mut tx = self.unsigned_tx()?;
        for (txin, spender) in tx.input.iter_mut().zip(&self.spenders) {
            if spender.is_wpkh() {
                txin.witness = Witness::from_slice(&[
                    vec![0u8; DUMMY_SIG_LEN],
                    vec![0u8; DUMMY_PUBKEY_LEN],
                ]);
            } else {
                txin.script_sig = Builder::new()
                    .push_slice([0u8; DUMMY_SIG_LEN])
                    .push_slice([0u8; DUMMY_PUBKEY_LEN])
                    .into_script();
            }
        }
        Ok(tx.vsize() as u64)
    }

    /// Fee owed at `fee_rate` sat/vB for [`Self::estimate_vsize`].
    pub fn estimate_fee(&self, fee_rate: f64) -> Result<Amount, TemplateError> {
        Ok(fee_for_vsize(fee_rate, self.estimate_vsize()?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        borsh::to_vec(&TemplateWire::from(self)).map_err(|e| TemplateError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        let wire: TemplateWire =
            borsh::from_slice(bytes).map_err(|e| TemplateError::Decode(e.to_string()))?;
        Ok(wire.into())
    }
}

fn checked_sum(mut values: impl Iterator<Item = Amount>) -> Result<Amount, TemplateError> {
    values.try_fold(Amount::ZERO, |acc, v| {
        acc.checked_add(v).ok_or(TemplateError::ValueOverflow)
    })
}

#[derive(BorshSerialize, BorshDeserialize)]
struct SpenderWire {
    txid: [u8; 32],
    vout: u32,
    value: u64,
    script_pubkey: Option<Vec<u8>>,
    redeem_script: Option<Vec<u8>>,
    sequence: u32,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct RecipientWire {
    value: u64,
    script_pubkey: Vec<u8>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct TemplateWire {
    version: i32,
    lock_time: u32,
    spenders: Vec<SpenderWire>,
    recipients: Vec<RecipientWire>,
}

impl From<&PayinTemplate> for TemplateWire {
    fn from(t: &PayinTemplate) -> Self {
        Self {
            version: t.version.0,
            lock_time: t.lock_time.to_consensus_u32(),
            spenders: t
                .spenders
                .iter()
                .map(|s| SpenderWire {
                    txid: s.outpoint.txid.to_byte_array(),
                    vout: s.outpoint.vout,
                    value: s.value.to_sat(),
                    script_pubkey: s.script_pubkey.as_ref().map(|spk| spk.to_bytes()),
                    redeem_script: s.redeem_script.as_ref().map(|rs| rs.to_bytes()),
                    sequence: s.sequence.to_consensus_u32(),
                })
                .collect(),
            recipients: t
                .recipients
                .iter()
                .map(|r| RecipientWire {
                    value: r.value.to_sat(),
                    script_pubkey: r.script_pubkey.to_bytes(),
                })
                .collect(),
        }
    }
}

impl From<TemplateWire> for PayinTemplate {
    fn from(w: TemplateWire) -> Self {
        Self {
            version: Version(w.version),
            lock_time: LockTime::from_consensus(w.lock_time),
            spenders: w
                .spenders
                .into_iter()
                .map(|s| Spender {
                    outpoint: OutPoint::new(Txid::from_byte_array(s.txid), s.vout),
                    value: Amount::from_sat(s.value),
                    script_pubkey: s.script_pubkey.map(ScriptBuf::from_bytes),
                    redeem_script: s.redeem_script.map(ScriptBuf::from_bytes),
                    sequence: Sequence::from_consensus(s.sequence),
                })
                .collect(),
            recipients: w
                .recipients
                .into_iter()
                .map(|r| TxOut {
                    value: Amount::from_sat(r.value),
                    script_pubkey: ScriptBuf::from_bytes(r.script_pubkey),
                })
                .collect(),
        }
    }
}
