use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Counterparty role in a settlement.
#[repr(u8)]
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    BorshDeserialize,
    BorshSerialize,
    Serialize,
    Deserialize,
)]
#[borsh(use_discriminant = true)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buyer = 0,
    Seller = 1,
}

impl Side {
    /// Tag under which this side's key is placed in the settlement multisig.
    ///
    /// Both counterparties must agree on it, otherwise they derive different addresses.
    pub fn key_tag(self) -> u8 {
        self as u8
    }

    pub fn counterparty(self) -> Self {
        match self {
            Side::Buyer => Side::Seller,
            Side::Seller => Side::Buyer,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buyer => f.write_str("buyer"),
            Side::Seller => f.write_str("seller"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tags() {
        assert_eq!(Side::Buyer.key_tag(), 0x00);
        assert_eq!(Side::Seller.key_tag(), 0x01);
        assert_eq!(Side::Buyer.counterparty(), Side::Seller);
    }
}
