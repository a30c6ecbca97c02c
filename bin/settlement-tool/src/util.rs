use std::{env, fs, path::Path, str::FromStr};

use anyhow::Context;
use bitcoin::{Network, Txid};
use bs_settlement::Utxo;
use serde::Serialize;

/// Environment variable consulted when no `--network` flag is given.
const NETWORK_ENVVAR: &str = "BS_NETWORK";

/// Resolves the network from the command line, then the environment, then the config file.
pub(crate) fn resolve_network(arg: Option<&str>, configured: Network) -> anyhow::Result<Network> {
    if let Some(network_str) = arg {
        return parse_network(network_str);
    }

    if let Ok(env_network) = env::var(NETWORK_ENVVAR) {
        return parse_network(&env_network)
            .with_context(|| format!("invalid {NETWORK_ENVVAR}"));
    }

    Ok(configured)
}

fn parse_network(s: &str) -> anyhow::Result<Network> {
    match s {
        "mainnet" => Ok(Network::Bitcoin),
        n => Network::from_str(n).map_err(|_| anyhow::anyhow!("unsupported network option: {n}")),
    }
}

pub(crate) fn parse_hex(what: &str, s: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(s.trim()).with_context(|| format!("{what} is not valid hex"))
}

pub(crate) fn parse_txid(what: &str, s: &str) -> anyhow::Result<Txid> {
    Txid::from_str(s.trim()).with_context(|| format!("{what} is not a valid txid"))
}

/// Reads the outputs spent by a pay-in from a JSON array of [`Utxo`].
pub(crate) fn read_utxos(path: &Path) -> anyhow::Result<Vec<Utxo>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed utxo list in {}", path.display()))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_flag_wins_over_config() {
        let net = resolve_network(Some("regtest"), Network::Bitcoin).unwrap();
        assert_eq!(net, Network::Regtest);

        let net = resolve_network(Some("mainnet"), Network::Signet).unwrap();
        assert_eq!(net, Network::Bitcoin);
    }

    #[test]
    fn test_unknown_network_rejected() {
        assert!(resolve_network(Some("moonnet"), Network::Bitcoin).is_err());
    }

    #[test]
    fn test_parse_hex_trims_whitespace() {
        assert_eq!(parse_hex("tx", " 00ff\n").unwrap(), vec![0x00, 0xff]);
        assert!(parse_hex("tx", "zz").is_err());
    }

    #[test]
    fn test_parse_txid() {
        let hex_txid = "a1075db55d416d3ca199f55b6084e2115b9345e16c5cf302fc80e9d5fbf5d48d";
        assert_eq!(parse_txid("txid", hex_txid).unwrap().to_string(), hex_txid);
        assert!(parse_txid("txid", "abcd").is_err());
    }

    #[test]
    fn test_read_utxos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utxos.json");
        fs::write(&path, "[]").unwrap();
        assert!(read_utxos(&path).unwrap().is_empty());

        fs::write(&path, "{").unwrap();
        assert!(read_utxos(&path).is_err());
        assert!(read_utxos(&dir.path().join("missing.json")).is_err());
    }
}
