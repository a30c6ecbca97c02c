use bitcoin::Network;
use bs_primitives::{AuthKey, SettlementId};
use bs_settlement::{min_trade_amount, Settlement};
use serde::Serialize;

use crate::{
    args::{CmdContext, SubcDeriveAddress, SubcMinAmount},
    util::print_json,
};

#[derive(Debug, Serialize)]
struct DerivedSettlement {
    settlement_id: SettlementId,
    network: Network,
    address: String,
    script_pubkey: String,
    witness_script: String,
    buyer_salted_key: String,
    seller_salted_key: String,
}

impl DerivedSettlement {
    fn new(settlement: &Settlement, network: Network) -> Self {
        let salted = settlement.salted_keys();
        Self {
            settlement_id: *settlement.id(),
            network,
            address: settlement.address().to_string(),
            script_pubkey: hex::encode(settlement.script_pubkey().as_bytes()),
            witness_script: hex::encode(settlement.witness_script().as_bytes()),
            buyer_salted_key: salted.buyer.to_string(),
            seller_salted_key: salted.seller.to_string(),
        }
    }
}

pub(super) fn exec_derive_address(cmd: SubcDeriveAddress, ctx: &CmdContext) -> anyhow::Result<()> {
    let id = SettlementId::from_hex(&cmd.settlement_id)?;
    let buyer = AuthKey::from_hex(&cmd.buyer)?;
    let seller = AuthKey::from_hex(&cmd.seller)?;
    let network = ctx.verify.network;

    let settlement = Settlement::derive(id, buyer, seller, network)?;
    print_json(&DerivedSettlement::new(&settlement, network))
}

#[derive(Debug, Serialize)]
struct MinAmount {
    fee_rate: f64,
    min_trade_amount: u64,
}

pub(super) fn exec_min_amount(cmd: SubcMinAmount, ctx: &CmdContext) -> anyhow::Result<()> {
    if !(cmd.fee_rate.is_finite() && cmd.fee_rate >= 0.0) {
        anyhow::bail!("fee rate must be a non-negative number");
    }
    let amount = min_trade_amount(cmd.fee_rate, &ctx.verify.policy)?;
    print_json(&MinAmount {
        fee_rate: cmd.fee_rate,
        min_trade_amount: amount.to_sat(),
    })
}
