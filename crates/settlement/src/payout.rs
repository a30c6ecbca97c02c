//! Validation and signer attribution of signed pay-outs.

use std::{fmt, str::FromStr};

use bitcoin::{consensus, Address, Amount, OutPoint, Transaction, TxOut, Txid};
use bs_primitives::{AuthKey, SettlementId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    derive::SaltedKeys,
    fee::{allowed_fee_rate_min, fee_for_vsize},
    utxo::PrevoutMap,
    verifier::{TransactionVerifier, VerifyFlags},
    AttributionError, PayoutError, VerifyContext,
};

/// Who produced the signature over the settlement input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutSignatureType {
    /// No signature, or the transaction could not be evaluated.
    Failed,
    /// Signed by the buyer's salted key.
    ByBuyer,
    /// Signed by the seller's salted key.
    BySeller,
    /// Signed, but by neither salted key.
    Undefined,
}

impl fmt::Display for PayoutSignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Failed => "Failed",
            Self::ByBuyer => "ByBuyer",
            Self::BySeller => "BySeller",
            Self::Undefined => "Undefined",
        };
        f.write_str(s)
    }
}

/// Identifies which salted key signed the settlement input of `tx`.
///
/// Without `payin_txid`, input 0 is the settlement input and its previous output must be in
/// `prevouts`. With it, the settlement input is whichever input spends `payin_txid:0`; a
/// transaction not spending that outpoint is [`PayoutSignatureType::Undefined`].
pub fn which_signature(
    tx: &Transaction,
    prevouts: &PrevoutMap,
    salted: &SaltedKeys,
    payin_txid: Option<Txid>,
) -> PayoutSignatureType {
    attribute_signer(tx, prevouts, salted, payin_txid).unwrap_or_else(|err| {
        warn!(%err, txid = %tx.compute_txid(), "payout signer attribution failed");
        PayoutSignatureType::Failed
    })
}

fn attribute_signer(
    tx: &Transaction,
    prevouts: &PrevoutMap,
    salted: &SaltedKeys,
    payin_txid: Option<Txid>,
) -> Result<PayoutSignatureType, AttributionError> {
    if tx.input.is_empty() {
        return Err(AttributionError::NoInputs);
    }

    let index = match payin_txid {
        None => 0,
        Some(payin) => {
            let settlement_outpoint = OutPoint::new(payin, 0);
            let Some(index) = tx
                .input
                .iter()
                .position(|txin| txin.previous_output == settlement_outpoint)
            else {
                return Ok(PayoutSignatureType::Undefined);
            };
            index
        }
    };

    let state =
        TransactionVerifier::new(tx, prevouts, VerifyFlags::STANDARD).evaluate_input(index)?;
    if state.signature_count == 0 {
        return Err(AttributionError::NoSignatures(tx.compute_txid()));
    }

    Ok(if state.is_signed_by(&salted.buyer) {
        PayoutSignatureType::ByBuyer
    } else if state.is_signed_by(&salted.seller) {
        PayoutSignatureType::BySeller
    } else {
        PayoutSignatureType::Undefined
    })
}

/// Inputs of a pay-out check, in the form they arrive from the negotiation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutVerifyRequest {
    /// Consensus-serialized signed pay-out.
    pub signed_payout: Vec<u8>,
    pub buyer_auth_key: String,
    pub seller_auth_key: String,
    pub payin_txid: Txid,
    pub trade_amount: Amount,
    pub fee_rate: f64,
    pub settlement_id: String,
    pub settlement_address: String,
}

/// Accepted signed pay-out.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutVerification {
    pub payout_txid: Txid,
    pub total_fee: Amount,
    pub estimated_fee: Amount,
    pub signed_by: PayoutSignatureType,
}

/// Checks a signed pay-out spending the settlement output of a pay-in.
///
/// Only a single-input, single-output spend of `payin_txid:0`, paying no more than the trade
/// amount with enough fee and signed by the buyer's salted key, is accepted.
pub fn verify_signed_payout(
    req: &PayoutVerifyRequest,
    ctx: &VerifyContext,
) -> Result<PayoutVerification, PayoutError> {
    let result = check_signed_payout(req, ctx);
    match &result {
        Ok(res) => debug!(
            payout_txid = %res.payout_txid,
            total_fee = %res.total_fee,
            "signed payout verified"
        ),
        Err(err) => warn!(%err, payin_txid = %req.payin_txid, "signed payout rejected"),
    }
    result
}

fn check_signed_payout(
    req: &PayoutVerifyRequest,
    ctx: &VerifyContext,
) -> Result<PayoutVerification, PayoutError> {
    if req.signed_payout.is_empty() {
        return Err(PayoutError::Empty);
    }
    let tx: Transaction = consensus::deserialize(&req.signed_payout)
        .map_err(|e| PayoutError::Decode(e.to_string()))?;

    if tx.input.len() != 1 {
        return Err(PayoutError::InputCount(tx.input.len()));
    }
    if tx.output.len() != 1 {
        return Err(PayoutError::OutputCount(tx.output.len()));
    }

    let expected = OutPoint::new(req.payin_txid, 0);
    let actual = tx.input[0].previous_output;
    if actual != expected {
        return Err(PayoutError::UnexpectedOutpoint { actual, expected });
    }

    let receive_value = tx.output[0].value;
    if receive_value > req.trade_amount {
        return Err(PayoutError::Overspend {
            value: receive_value.to_sat(),
            trade_amount: req.trade_amount.to_sat(),
        });
    }
    let total_fee = req.trade_amount - receive_value;

    let vsize = tx.vsize() as u64;
    let fee_rate_min = allowed_fee_rate_min(req.fee_rate, &ctx.policy);
    let estimated_fee = fee_for_vsize(fee_rate_min, vsize);
    if total_fee < estimated_fee {
        return Err(PayoutError::FeeTooSmall {
            fee: total_fee.to_sat(),
            rate: total_fee.to_sat() as f64 / vsize as f64,
            expected: estimated_fee.to_sat(),
            expected_rate: fee_rate_min,
        });
    }

    let buyer = AuthKey::from_hex(&req.buyer_auth_key)?;
    let seller = AuthKey::from_hex(&req.seller_auth_key)?;
    let settlement_id = SettlementId::from_hex(&req.settlement_id)?;
    let salted = SaltedKeys::derive(&settlement_id, &buyer, &seller)?;

    let settlement_spk = Address::from_str(&req.settlement_address)
        .and_then(|addr| addr.require_network(ctx.network))
        .map_err(|e| PayoutError::InvalidSettlementAddress(e.to_string()))?
        .script_pubkey();
    let prevouts = PrevoutMap::from([(
        expected,
        TxOut {
            value: req.trade_amount,
            script_pubkey: settlement_spk,
        },
    )]);

    match attribute_signer(&tx, &prevouts, &salted, None) {
        Ok(PayoutSignatureType::ByBuyer) => Ok(PayoutVerification {
            payout_txid: tx.compute_txid(),
            total_fee,
            estimated_fee,
            signed_by: PayoutSignatureType::ByBuyer,
        }),
        Ok(signed_by) => Err(PayoutError::UnexpectedSigner {
            signed_by,
            reason: String::new(),
        }),
        Err(err) => Err(PayoutError::UnexpectedSigner {
            signed_by: PayoutSignatureType::Failed,
            reason: err.to_string(),
        }),
    }
}
