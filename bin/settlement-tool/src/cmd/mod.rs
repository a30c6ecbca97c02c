mod derive;
mod verify;

use crate::args::{CmdContext, Subcommand};

/// Executes a subcommand.
pub(crate) fn exec_subc(cmd: Subcommand, ctx: &CmdContext) -> anyhow::Result<()> {
    match cmd {
        Subcommand::DeriveAddress(subc) => derive::exec_derive_address(subc, ctx),
        Subcommand::VerifyPayin(subc) => verify::exec_verify_payin(subc, ctx),
        Subcommand::VerifyPayout(subc) => verify::exec_verify_payout(subc, ctx),
        Subcommand::VerifySignedPayin(subc) => verify::exec_verify_signed_payin(subc, ctx),
        Subcommand::MinAmount(subc) => derive::exec_min_amount(subc, ctx),
    }
}
