//! Command line arguments for the `bs-settlement-tool` binary.

use std::path::PathBuf;

use argh::FromArgs;
use bitcoin::Network;
use bs_common::logging::LoggerConfig;
use bs_config::Config;
use bs_settlement::VerifyContext;

use crate::util::resolve_network;

/// Args.
#[derive(FromArgs)]
pub(crate) struct Args {
    #[argh(option, description = "path to a TOML config file", short = 'c')]
    pub(crate) config: Option<PathBuf>,

    #[argh(
        option,
        description = "network name [bitcoin, testnet, signet, regtest], overrides the config",
        short = 'n'
    )]
    pub(crate) network: Option<String>,

    #[argh(subcommand)]
    pub(crate) subc: Subcommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub(crate) enum Subcommand {
    DeriveAddress(SubcDeriveAddress),
    VerifyPayin(SubcVerifyPayin),
    VerifyPayout(SubcVerifyPayout),
    VerifySignedPayin(SubcVerifySignedPayin),
    MinAmount(SubcMinAmount),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "derive-address",
    description = "derives the settlement address for a trade"
)]
pub(crate) struct SubcDeriveAddress {
    #[argh(option, description = "32-byte settlement id (hex)")]
    pub(crate) settlement_id: String,

    #[argh(option, description = "buyer auth pubkey (compressed, hex)")]
    pub(crate) buyer: String,

    #[argh(option, description = "seller auth pubkey (compressed, hex)")]
    pub(crate) seller: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "verify-payin",
    description = "checks an unsigned pay-in template against the trade terms"
)]
pub(crate) struct SubcVerifyPayin {
    #[argh(option, description = "serialized pay-in template (hex)")]
    pub(crate) template: String,

    #[argh(option, description = "agreed fee rate in sat/vB")]
    pub(crate) fee_rate: f64,

    #[argh(option, description = "expected settlement address")]
    pub(crate) settlement_address: String,

    #[argh(option, description = "trade amount in satoshis")]
    pub(crate) amount: u64,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "verify-payout",
    description = "checks a signed pay-out and reports who signed it"
)]
pub(crate) struct SubcVerifyPayout {
    #[argh(option, description = "signed pay-out transaction (hex)")]
    pub(crate) tx: String,

    #[argh(option, description = "buyer auth pubkey (compressed, hex)")]
    pub(crate) buyer: String,

    #[argh(option, description = "seller auth pubkey (compressed, hex)")]
    pub(crate) seller: String,

    #[argh(option, description = "txid of the pay-in being spent")]
    pub(crate) payin_txid: String,

    #[argh(option, description = "trade amount in satoshis")]
    pub(crate) amount: u64,

    #[argh(option, description = "agreed fee rate in sat/vB")]
    pub(crate) fee_rate: f64,

    #[argh(option, description = "32-byte settlement id (hex)")]
    pub(crate) settlement_id: String,

    #[argh(option, description = "expected settlement address")]
    pub(crate) settlement_address: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "verify-signed-payin",
    description = "checks a signed pay-in against the txid agreed on while unsigned"
)]
pub(crate) struct SubcVerifySignedPayin {
    #[argh(option, description = "signed pay-in transaction (hex)")]
    pub(crate) tx: String,

    #[argh(option, description = "txid of the unsigned pay-in")]
    pub(crate) payin_txid: String,

    #[argh(option, description = "JSON file listing the spent outputs")]
    pub(crate) utxos: PathBuf,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "min-amount",
    description = "prints the smallest trade amount whose pay-out clears dust at a fee rate"
)]
pub(crate) struct SubcMinAmount {
    #[argh(option, description = "fee rate in sat/vB")]
    pub(crate) fee_rate: f64,
}

#[derive(Debug)]
pub(crate) struct CmdContext {
    /// Network and policy every check runs under.
    pub(crate) verify: VerifyContext,

    pub(crate) logging: LoggerConfig,
}

/// Resolves the command context and subcommand from the parsed command line arguments.
pub(crate) fn resolve_context_and_subcommand(
    args: Args,
) -> anyhow::Result<(CmdContext, Subcommand)> {
    let (config, logging) = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            let logging = config.logging.clone();
            (config, logging)
        }
        // Keep the terminal quiet unless asked otherwise.
        None => (
            Config::default(),
            LoggerConfig::new("bs-settlement-tool".to_string()).with_level("warn"),
        ),
    };

    let network: Network = resolve_network(args.network.as_deref(), config.network)?;
    let verify = VerifyContext::new(network).with_policy(config.policy);

    let ctx = CmdContext {
        verify,
        logging: logging.with_stderr(true),
    };

    Ok((ctx, args.subc))
}

#[cfg(test)]
mod tests {
    use bs_settlement::SettlementPolicy;

    use super::*;

    #[test]
    fn test_parse_derive_address() {
        let args = Args::from_args(
            &["bs-settlement-tool"],
            &[
                "-n",
                "regtest",
                "derive-address",
                "--settlement-id",
                "aa",
                "--buyer",
                "bb",
                "--seller",
                "cc",
            ],
        )
        .expect("parses");

        assert_eq!(args.network.as_deref(), Some("regtest"));
        assert_eq!(
            args.subc,
            Subcommand::DeriveAddress(SubcDeriveAddress {
                settlement_id: "aa".to_string(),
                buyer: "bb".to_string(),
                seller: "cc".to_string(),
            })
        );
    }

    #[test]
    fn test_context_defaults_without_config() {
        let args = Args::from_args(
            &["bs-settlement-tool"],
            &["-n", "signet", "min-amount", "--fee-rate", "1"],
        )
        .expect("parses");

        let (ctx, subc) = resolve_context_and_subcommand(args).expect("resolves");
        assert_eq!(ctx.verify.network, Network::Signet);
        assert_eq!(ctx.verify.policy, SettlementPolicy::default());
        assert_eq!(ctx.logging.level, "warn");
        assert!(ctx.logging.stdout_config.use_stderr);
        assert_eq!(subc, Subcommand::MinAmount(SubcMinAmount { fee_rate: 1.0 }));
    }

    #[test]
    fn test_context_reads_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settlement.toml");
        std::fs::write(
            &path,
            "network = \"testnet\"\n[policy]\nfee_tolerance = 0.1\n[logging]\nlevel = \"debug\"\n",
        )
        .expect("write config");

        let args = Args::from_args(
            &["bs-settlement-tool"],
            &[
                "--config",
                path.to_str().expect("utf8 path"),
                "min-amount",
                "--fee-rate",
                "2",
            ],
        )
        .expect("parses");

        let (ctx, _) = resolve_context_and_subcommand(args).expect("resolves");
        assert_eq!(ctx.verify.network, Network::Testnet);
        assert_eq!(ctx.verify.policy.fee_tolerance, 0.1);
        assert_eq!(ctx.logging.level, "debug");
        assert!(ctx.logging.stdout_config.use_stderr);
    }
}
