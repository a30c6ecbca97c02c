use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use borsh::{BorshDeserialize, BorshSerialize};
use secp256k1::{constants::PUBLIC_KEY_SIZE, PublicKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::ParseError;

/// Compressed secp256k1 public key identifying one counterparty of a trade.
///
/// Only the 33-byte compressed encoding is accepted so that both sides serialize the derived
/// settlement script identically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuthKey(PublicKey);

impl AuthKey {
    pub fn new(key: PublicKey) -> Self {
        Self(key)
    }

    /// Parses a compressed key, rejecting uncompressed encodings and points off the curve.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(ParseError::InvalidLength {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self(PublicKey::from_slice(bytes)?))
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn inner(&self) -> &PublicKey {
        &self.0
    }

    pub fn serialize(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }
}

impl From<PublicKey> for AuthKey {
    fn from(value: PublicKey) -> Self {
        Self(value)
    }
}

impl From<AuthKey> for PublicKey {
    fn from(value: AuthKey) -> Self {
        value.0
    }
}

impl FromStr for AuthKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthKey({})", self.to_hex())
    }
}

impl Serialize for AuthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AuthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize<'de>>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

impl BorshSerialize for AuthKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.0.serialize())
    }
}

impl BorshDeserialize for AuthKey {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; PUBLIC_KEY_SIZE];
        reader.read_exact(&mut buf)?;
        Self::from_slice(&buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }
}
