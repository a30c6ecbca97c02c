//! Value types exchanged at the boundary of the settlement core.
//!
//! Everything in here is hex-encoded on the wire and parsed into a strongly typed form before it
//! reaches any verification code.

pub mod errors;
pub mod keys;
pub mod roles;
pub mod settlement_id;

pub use errors::ParseError;
pub use keys::AuthKey;
pub use roles::Side;
pub use settlement_id::SettlementId;
