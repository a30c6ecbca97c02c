//! Validation of an unsigned pay-in proposed by a counterparty.

use std::str::FromStr;

use bitcoin::{hashes::Hash, Address, Amount, ScriptBuf, ScriptHash, Txid};
use tracing::{debug, warn};

use crate::{
    fee::{allowed_fee_rate_min, fee_for_vsize},
    template::PayinTemplate,
    utxo::Utxo,
    PayinError, VerifyContext,
};

/// Accepted unsigned pay-in.
#[derive(Debug, Clone, PartialEq)]
pub struct PayinVerification {
    pub total_fee: Amount,

    /// Lowest fee the pay-in could have carried.
    pub estimated_fee: Amount,

    pub total_output_count: usize,

    /// Address of the first non-settlement output.
    pub change_address: Option<String>,

    /// Outputs the pay-in spends.
    pub utxos: Vec<Utxo>,

    /// Txid of the pay-in; the pay-out must spend output 0 of it.
    pub payin_txid: Txid,
}

/// Checks an unsigned pay-in template before co-signing or funding it.
///
/// The settlement output must sit at index 0 and carry exactly `trade_amount`, every other output
/// must be above dust, inputs must be P2WPKH (plain or P2SH-nested), and the fee must satisfy
/// `fee_rate` within policy tolerance.
pub fn verify_unsigned_payin(
    template: &PayinTemplate,
    fee_rate: f64,
    settlement_address: &str,
    trade_amount: Amount,
    ctx: &VerifyContext,
) -> Result<PayinVerification, PayinError> {
    let result = check_unsigned_payin(template, fee_rate, settlement_address, trade_amount, ctx);
    match &result {
        Ok(res) => debug!(
            payin_txid = %res.payin_txid,
            total_fee = %res.total_fee,
            estimated_fee = %res.estimated_fee,
            "unsigned payin verified"
        ),
        Err(err) => warn!(%err, %settlement_address, "unsigned payin rejected"),
    }
    result
}

fn check_unsigned_payin(
    template: &PayinTemplate,
    fee_rate: f64,
    settlement_address: &str,
    trade_amount: Amount,
    ctx: &VerifyContext,
) -> Result<PayinVerification, PayinError> {
    if !template.is_resolved() {
        return Err(PayinError::Unresolved);
    }

    let settlement_spk = Address::from_str(settlement_address)
        .and_then(|addr| addr.require_network(ctx.network))
        .map_err(|e| PayinError::InvalidSettlementAddress(e.to_string()))?
        .script_pubkey();
    let dust = ctx.policy.native_segwit_dust();

    let mut settlement_amount = None;
    let mut settlement_count = 0;
    let mut change_address = None;
    for (index, out) in template.recipients.iter().enumerate() {
        if out.script_pubkey == settlement_spk {
            if index != 0 {
                return Err(PayinError::SettlementOutputIndex { index });
            }
            settlement_count += 1;
            settlement_amount = Some(out.value);
        } else {
            if out.value <= dust {
                return Err(PayinError::DustOutput {
                    index,
                    value: out.value.to_sat(),
                });
            }
            if change_address.is_none() {
                change_address = Address::from_script(&out.script_pubkey, ctx.network)
                    .ok()
                    .map(|addr| addr.to_string());
            }
        }
    }

    let settlement_amount = match (settlement_count, settlement_amount) {
        (1, Some(amount)) => amount,
        (count, _) => return Err(PayinError::SettlementOutputCount { count }),
    };
    if settlement_amount != trade_amount {
        return Err(PayinError::SettlementAmount {
            actual: settlement_amount.to_sat(),
            expected: trade_amount.to_sat(),
        });
    }

    let total_input = template.total_input()?;
    let total_output = template.total_output()?;
    if total_input < total_output {
        return Err(PayinError::InputsBelowOutputs {
            inputs: total_input.to_sat(),
            outputs: total_output.to_sat(),
        });
    }

    if template.is_rbf() {
        return Err(PayinError::Rbf);
    }

    let total_fee = total_input - total_output;
    let fee_rate_min = allowed_fee_rate_min(fee_rate, &ctx.policy);
    let estimated_fee = fee_for_vsize(fee_rate_min, template.estimate_vsize()?);
    if total_fee < estimated_fee {
        return Err(PayinError::FeeTooSmall {
            fee: total_fee.to_sat(),
            expected: estimated_fee.to_sat(),
            rate: fee_rate_min,
        });
    }

    for spender in &template.spenders {
        let Some(spk) = &spender.script_pubkey else {
            return Err(PayinError::Unresolved);
        };
        let accepted = spk.is_p2wpkh()
            || (spk.is_p2sh()
                && spender.redeem_script.as_ref().is_some_and(|redeem| {
                    redeem.is_p2wpkh()
                        && ScriptBuf::new_p2sh(&ScriptHash::hash(redeem.as_bytes())) == *spk
                }));
        if !accepted {
            return Err(PayinError::UnsupportedInputType);
        }
    }

    Ok(PayinVerification {
        total_fee,
        estimated_fee,
        total_output_count: template.recipients.len(),
        change_address,
        utxos: template.utxos()?,
        payin_txid: template.txid()?,
    })
}
