//! Cross-check of a signed pay-in the local party did not build.

use bitcoin::{consensus, Amount, Transaction, Txid};
use tracing::{debug, warn};

use crate::{
    utxo::{prevout_map, Utxo},
    verifier::{TransactionVerifier, VerifyFlags},
    SignedPayinError, VerifyError,
};

/// Accepted signed pay-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayinVerification {
    pub txid: Txid,
    pub vsize: u64,
    pub total_input: Amount,
    pub total_output: Amount,
}

/// Verifies every input of a signed pay-in against the outputs it spends.
///
/// `prev_utxos` usually comes from chain queries and may be stale or adversarial; any mismatch
/// is returned as an error.
pub fn verify_signed_payin(
    signed_payin: &[u8],
    expected_txid: Txid,
    prev_utxos: &[Utxo],
) -> Result<SignedPayinVerification, SignedPayinError> {
    let result = check_signed_payin(signed_payin, expected_txid, prev_utxos);
    match &result {
        Ok(res) => debug!(txid = %res.txid, vsize = res.vsize, "signed payin verified"),
        Err(err) => warn!(%err, %expected_txid, "signed payin rejected"),
    }
    result
}

fn check_signed_payin(
    signed_payin: &[u8],
    expected_txid: Txid,
    prev_utxos: &[Utxo],
) -> Result<SignedPayinVerification, SignedPayinError> {
    if signed_payin.is_empty() {
        return Err(SignedPayinError::Empty);
    }
    let tx: Transaction = consensus::deserialize(signed_payin)
        .map_err(|e| SignedPayinError::Decode(e.to_string()))?;

    let txid = tx.compute_txid();
    if txid != expected_txid {
        return Err(SignedPayinError::HashMismatch {
            expected: expected_txid,
            actual: txid,
        });
    }
    if tx.weight().to_wu() == 0 {
        return Err(SignedPayinError::InvalidWeight);
    }

    let prevouts = prevout_map(prev_utxos);
    TransactionVerifier::new(&tx, &prevouts, VerifyFlags::STANDARD).verify()?;

    let total_input = tx
        .input
        .iter()
        .filter_map(|txin| prevouts.get(&txin.previous_output))
        .try_fold(Amount::ZERO, |acc, out| acc.checked_add(out.value))
        .ok_or(VerifyError::ValueOverflow)?;
    let total_output = tx
        .output
        .iter()
        .try_fold(Amount::ZERO, |acc, out| acc.checked_add(out.value))
        .ok_or(VerifyError::ValueOverflow)?;

    Ok(SignedPayinVerification {
        txid,
        vsize: tx.vsize() as u64,
        total_input,
        total_output,
    })
}
