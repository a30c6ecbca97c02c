use std::sync::Arc;

use bitcoin::{consensus, Amount, Transaction, Txid};
use bs_settlement::{
    prevout_map, settlement_utxo, verify_signed_payin, verify_signed_payout, which_signature,
    PayoutSignatureType, PayoutVerifyRequest, Settlement, SignedPayinError,
    SignedPayinVerification, VerifyContext,
};
use tracing::{info, warn};

use crate::{collect_prev_utxos, BlockchainQuery, MonitorError};

/// Runs settlement checks against live chain data and broadcasts what passes.
#[derive(Debug)]
pub struct SettlementMonitor<Q> {
    query: Arc<Q>,
    ctx: VerifyContext,
}

impl<Q: BlockchainQuery> SettlementMonitor<Q> {
    pub fn new(query: Arc<Q>, ctx: VerifyContext) -> Self {
        Self { query, ctx }
    }

    pub fn context(&self) -> &VerifyContext {
        &self.ctx
    }

    /// Verifies a signed pay-in against the outputs it spends, as currently known to the chain.
    pub async fn check_signed_payin(
        &self,
        signed_payin: &[u8],
        expected_txid: Txid,
    ) -> Result<SignedPayinVerification, MonitorError> {
        if signed_payin.is_empty() {
            return Err(SignedPayinError::Empty.into());
        }
        let tx: Transaction = consensus::deserialize(signed_payin)
            .map_err(|e| SignedPayinError::Decode(e.to_string()))?;
        let utxos = collect_prev_utxos(self.query.as_ref(), &tx).await?;
        Ok(verify_signed_payin(signed_payin, expected_txid, &utxos)?)
    }

    /// Verifies a signed pay-in and broadcasts it.
    pub async fn broadcast_payin(
        &self,
        signed_payin: &[u8],
        expected_txid: Txid,
    ) -> Result<Txid, MonitorError> {
        self.check_signed_payin(signed_payin, expected_txid).await?;
        let tx = decode(signed_payin)?;
        let txid = self.query.broadcast_zc(tx).await?;
        info!(%txid, "broadcast payin");
        Ok(txid)
    }

    /// Verifies a signed pay-out and broadcasts it.
    pub async fn broadcast_payout(&self, req: &PayoutVerifyRequest) -> Result<Txid, MonitorError> {
        let verified = verify_signed_payout(req, &self.ctx)?;
        let tx = decode(&req.signed_payout)?;
        let txid = self.query.broadcast_zc(tx).await?;
        info!(%txid, signed_by = %verified.signed_by, "broadcast payout");
        Ok(txid)
    }

    /// Attributes the signer of a transaction seen spending a settlement output.
    pub async fn payout_signer(
        &self,
        spender_txid: Txid,
        settlement: &Settlement,
        payin_txid: Txid,
        amount: Amount,
    ) -> Result<PayoutSignatureType, MonitorError> {
        let tx = self.query.get_tx_by_hash(spender_txid).await?;
        let utxo = settlement_utxo(settlement, payin_txid, amount);
        let signed_by = which_signature(
            &tx,
            &prevout_map([&utxo]),
            settlement.salted_keys(),
            Some(payin_txid),
        );
        if signed_by != PayoutSignatureType::ByBuyer {
            warn!(%spender_txid, %payin_txid, %signed_by, "settlement spent by unexpected signer");
        }
        Ok(signed_by)
    }
}

fn decode(bytes: &[u8]) -> Result<Transaction, MonitorError> {
    consensus::deserialize(bytes).map_err(|e| MonitorError::Decode(e.to_string()))
}
