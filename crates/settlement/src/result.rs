//! Flat outcome handed back to the negotiation layer.

use bitcoin::Txid;
use serde::{Deserialize, Serialize};

use crate::{
    payin::PayinVerification, payout::PayoutVerification, signed_payin::SignedPayinVerification,
    utxo::Utxo, PayinError, PayoutError, PayoutSignatureType, SignedPayinError,
};

/// Outcome of one verification, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeVerificationResult {
    pub success: bool,
    pub error_msg: String,
    pub total_fee: u64,
    pub estimated_fee: u64,
    pub total_output_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_addr: Option<String>,
    pub utxos: Vec<Utxo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payin_hash: Option<Txid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_tx_hash_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_by: Option<PayoutSignatureType>,
}

impl TradeVerificationResult {
    pub fn error(msg: impl ToString) -> Self {
        Self {
            success: false,
            error_msg: msg.to_string(),
            ..Default::default()
        }
    }
}

impl From<Result<PayinVerification, PayinError>> for TradeVerificationResult {
    fn from(res: Result<PayinVerification, PayinError>) -> Self {
        match res {
            Ok(v) => Self {
                success: true,
                total_fee: v.total_fee.to_sat(),
                estimated_fee: v.estimated_fee.to_sat(),
                total_output_count: v.total_output_count,
                change_addr: v.change_address,
                utxos: v.utxos,
                payin_hash: Some(v.payin_txid),
                ..Default::default()
            },
            Err(err) => Self::error(err),
        }
    }
}

impl From<Result<PayoutVerification, PayoutError>> for TradeVerificationResult {
    fn from(res: Result<PayoutVerification, PayoutError>) -> Self {
        match res {
            Ok(v) => Self {
                success: true,
                total_fee: v.total_fee.to_sat(),
                estimated_fee: v.estimated_fee.to_sat(),
                total_output_count: 1,
                payout_tx_hash_hex: Some(v.payout_txid.to_string()),
                signed_by: Some(v.signed_by),
                ..Default::default()
            },
            Err(err) => {
                let signed_by = match &err {
                    PayoutError::UnexpectedSigner { signed_by, .. } => Some(*signed_by),
                    _ => None,
                };
                Self {
                    signed_by,
                    ..Self::error(err)
                }
            }
        }
    }
}

impl From<Result<SignedPayinVerification, SignedPayinError>> for TradeVerificationResult {
    fn from(res: Result<SignedPayinVerification, SignedPayinError>) -> Self {
        match res {
            Ok(v) => Self {
                success: true,
                total_fee: v.total_input.to_sat().saturating_sub(v.total_output.to_sat()),
                payin_hash: Some(v.txid),
                ..Default::default()
            },
            Err(err) => Self::error(err),
        }
    }
}
