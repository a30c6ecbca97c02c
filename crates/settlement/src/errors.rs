//! Error types for the settlement core.
//!
//! Every public verification entry point reports failure through one of these; their `Display`
//! output is the human-readable message handed back to the negotiation layer.

use bitcoin::{script::PushBytesError, Amount, OutPoint, Txid};
use bs_primitives::ParseError;
use thiserror::Error;

use crate::payout::PayoutSignatureType;

/// Errors parsing a multisig witness script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("malformed script: {0}")]
    Malformed(#[from] bitcoin::script::Error),

    #[error("script is not a bare multisig")]
    NotMultisig,

    #[error("multisig contains an invalid pubkey: {0}")]
    InvalidKey(#[from] bitcoin::secp256k1::Error),
}

/// Errors deriving salted keys and settlement scripts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    /// The settlement id is zero or not below the curve order.
    #[error("settlement id is not a valid curve scalar")]
    InvalidSettlementId,

    #[error("key tweak failed: {0}")]
    Tweak(bitcoin::secp256k1::Error),

    #[error("invalid multisig: {required}-of-{total}")]
    InvalidMultisig { required: usize, total: usize },

    #[error("not a settlement script: {0}")]
    NotSettlementScript(#[from] ScriptError),
}

/// Errors handling an unsigned pay-in template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("spender #{index} is unresolved")]
    Unresolved { index: usize },

    #[error("amount overflow while summing values")]
    ValueOverflow,

    #[error("redeem script too large: {0}")]
    RedeemScript(#[from] PushBytesError),

    #[error("failed to encode template: {0}")]
    Encode(String),

    #[error("failed to decode template: {0}")]
    Decode(String),
}

/// Errors verifying input scripts against previous outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("input #{input} spends unknown outpoint {outpoint}")]
    MissingPrevout { input: usize, outpoint: OutPoint },

    #[error("input #{input} requires verification flag {flag}")]
    FlagNotSet { input: usize, flag: &'static str },

    #[error("input #{input} spends an unsupported script type")]
    UnsupportedScript { input: usize },

    #[error("input #{input} has a malformed witness: {reason}")]
    MalformedWitness { input: usize, reason: &'static str },

    #[error("input #{input} has a malformed script sig")]
    MalformedScriptSig { input: usize },

    #[error("input #{input} does not match the committed script hash")]
    ScriptHashMismatch { input: usize },

    #[error("input #{input} sighash computation failed: {reason}")]
    Sighash { input: usize, reason: String },

    #[error("input #{input} is not fully signed")]
    IncompleteSignatures { input: usize },

    #[error("input index {0} out of range")]
    InputIndex(usize),

    #[error("amount overflow while summing values")]
    ValueOverflow,

    #[error("inputs {inputs} do not cover outputs {outputs}")]
    InsufficientInputValue { inputs: Amount, outputs: Amount },
}

/// Reasons an unsigned pay-in is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayinError {
    #[error("unresolved unsigned payin")]
    Unresolved,

    #[error("invalid settlement address: {0}")]
    InvalidSettlementAddress(String),

    #[error("unexpected settlement output id: {index}, expected 0")]
    SettlementOutputIndex { index: usize },

    #[error("output #{index} is a dust ({value})")]
    DustOutput { index: usize, value: u64 },

    #[error("unexpected settlement outputs count: {count}, expected 1")]
    SettlementOutputCount { count: usize },

    #[error("unexpected settlement amount: {actual}, expected {expected}")]
    SettlementAmount { actual: u64, expected: u64 },

    #[error("total inputs {inputs} lower that outputs {outputs}")]
    InputsBelowOutputs { inputs: u64, outputs: u64 },

    #[error("Pay-In could not be RBF transaction")]
    Rbf,

    #[error("fee is too small: {fee}, expected: {expected} ({rate} s/b)")]
    FeeTooSmall { fee: u64, expected: u64, rate: f64 },

    #[error("Not supported input type used")]
    UnsupportedInputType,

    #[error("exception during payin processing: {0}")]
    Template(#[from] TemplateError),
}

/// Reasons a signed pay-out is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayoutError {
    #[error("signed payout is not provided")]
    Empty,

    #[error("failed to decode payout: {0}")]
    Decode(String),

    #[error("invalid boundary value: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid settlement address: {0}")]
    InvalidSettlementAddress(String),

    #[error("unexpected number of inputs: {0}")]
    InputCount(usize),

    #[error("unexpected number of outputs: {0}")]
    OutputCount(usize),

    #[error("payout uses unexpected outpoint: {actual}. Expected: {expected}")]
    UnexpectedOutpoint { actual: OutPoint, expected: OutPoint },

    #[error("payout try to spend {value} when trade amount is {trade_amount}")]
    Overspend { value: u64, trade_amount: u64 },

    #[error("fee is too small: {fee} ({rate:.2} s/b). Expected: {expected} ({expected_rate} s/b)")]
    FeeTooSmall {
        fee: u64,
        rate: f64,
        expected: u64,
        expected_rate: f64,
    },

    #[error("exception during payout processing: {0}")]
    Derive(#[from] DeriveError),

    #[error("payout signature status: {signed_by}, errorMsg: '{reason}'")]
    UnexpectedSigner {
        signed_by: PayoutSignatureType,
        reason: String,
    },
}

/// Reasons a signed pay-in fails the cross-check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignedPayinError {
    #[error("no signed payin provided")]
    Empty,

    #[error("failed to decode payin: {0}")]
    Decode(String),

    #[error("payin hash mismatch. Expected: {expected}. From signed payin: {actual}")]
    HashMismatch { expected: Txid, actual: Txid },

    #[error("failed to get TX weight")]
    InvalidWeight,

    #[error("TX verification against previous UTXOs failed: {0}")]
    Verification(#[from] VerifyError),
}

/// Reasons signer attribution fails outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributionError {
    #[error("transaction has no inputs")]
    NoInputs,

    #[error("no signatures received for TX: {0}")]
    NoSignatures(Txid),

    #[error("failed: {0}")]
    Verify(#[from] VerifyError),
}

/// Errors constructing or signing a pay-out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("settlement amount {amount} does not cover payout fee {fee}")]
    AmountBelowFee { amount: Amount, fee: Amount },

    #[error("payout must have exactly one input, found {0}")]
    InputCount(usize),

    #[error("sighash computation failed: {0}")]
    Sighash(String),

    #[error("signer failed: {0}")]
    Signer(String),

    #[error("payout fee at {0} sat/vB exceeds the bitcoin supply")]
    FeeOutOfRange(String),
}
