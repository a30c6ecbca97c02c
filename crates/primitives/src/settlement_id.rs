use std::{fmt, str::FromStr};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Size in bytes of a [`SettlementId`].
pub const SETTLEMENT_ID_LEN: usize = 32;

/// Per-trade identifier, also used as the scalar that salts both counterparties' auth keys.
///
/// Created by the negotiation layer when a trade request is accepted and never mutated afterwards.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SettlementId(#[serde(with = "hex::serde")] [u8; SETTLEMENT_ID_LEN]);

impl SettlementId {
    pub const fn new(bytes: [u8; SETTLEMENT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a settlement id from its raw bytes, rejecting anything that isn't 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let buf: [u8; SETTLEMENT_ID_LEN] =
            bytes.try_into().map_err(|_| ParseError::InvalidLength {
                expected: SETTLEMENT_ID_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(buf))
    }

    /// Parses a hex-encoded settlement id as received on the wire.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SETTLEMENT_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; SETTLEMENT_ID_LEN]> for SettlementId {
    fn from(value: [u8; SETTLEMENT_ID_LEN]) -> Self {
        Self(value)
    }
}

impl FromStr for SettlementId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SettlementId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let id = SettlementId::new([0x11; 32]);
        let parsed: SettlementId = id.to_hex().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_string(), "11".repeat(32));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = SettlementId::from_hex("aabb").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!(matches!(
            SettlementId::from_hex("zz"),
            Err(ParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = SettlementId::new([0xab; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: SettlementId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
