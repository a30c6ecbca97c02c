use bitcoin::Amount;
use bs_settlement::{
    verify_signed_payin, verify_signed_payout, verify_unsigned_payin, PayinTemplate,
    PayoutVerifyRequest, TradeVerificationResult,
};
use tracing::*;

use crate::{
    args::{CmdContext, SubcVerifyPayin, SubcVerifyPayout, SubcVerifySignedPayin},
    util::{parse_hex, parse_txid, print_json, read_utxos},
};

pub(super) fn exec_verify_payin(cmd: SubcVerifyPayin, ctx: &CmdContext) -> anyhow::Result<()> {
    let raw = parse_hex("template", &cmd.template)?;

    // A template that fails to decode is a rejected pay-in, not a usage error.
    let result = match PayinTemplate::from_bytes(&raw) {
        Ok(template) => TradeVerificationResult::from(verify_unsigned_payin(
            &template,
            cmd.fee_rate,
            &cmd.settlement_address,
            Amount::from_sat(cmd.amount),
            &ctx.verify,
        )),
        Err(e) => {
            warn!(%e, "pay-in template rejected");
            TradeVerificationResult::error(e)
        }
    };

    print_json(&result)
}

pub(super) fn exec_verify_payout(cmd: SubcVerifyPayout, ctx: &CmdContext) -> anyhow::Result<()> {
    let req = PayoutVerifyRequest {
        signed_payout: parse_hex("pay-out tx", &cmd.tx)?,
        buyer_auth_key: cmd.buyer,
        seller_auth_key: cmd.seller,
        payin_txid: parse_txid("pay-in txid", &cmd.payin_txid)?,
        trade_amount: Amount::from_sat(cmd.amount),
        fee_rate: cmd.fee_rate,
        settlement_id: cmd.settlement_id,
        settlement_address: cmd.settlement_address,
    };

    let result = TradeVerificationResult::from(verify_signed_payout(&req, &ctx.verify));
    print_json(&result)
}

pub(super) fn exec_verify_signed_payin(
    cmd: SubcVerifySignedPayin,
    _ctx: &CmdContext,
) -> anyhow::Result<()> {
    let raw = parse_hex("pay-in tx", &cmd.tx)?;
    let expected = parse_txid("pay-in txid", &cmd.payin_txid)?;
    let utxos = read_utxos(&cmd.utxos)?;

    let result = TradeVerificationResult::from(verify_signed_payin(&raw, expected, &utxos));
    print_json(&result)
}
