//! Settlement-trade verification and payment-channel construction.
//!
//! Derives the per-trade settlement address from the counterparties' auth keys and a settlement
//! id, validates the unsigned pay-in funding transaction, validates and attributes the signed
//! pay-out, and re-verifies signed pay-ins against their previous outputs.
//!
//! Every entry point is a synchronous pure function of its arguments. Nothing here performs I/O,
//! holds state between calls or panics on counterparty-controlled input; failures come back as
//! typed errors.

pub mod asset;
pub mod builder;
pub mod derive;
pub mod errors;
pub mod fee;
pub mod params;
pub mod payin;
pub mod payout;
pub mod result;
pub mod script;
pub mod signed_payin;
pub mod template;
pub mod utxo;
pub mod verifier;

pub use asset::{AssetEntry, KeyTag, MultisigAsset};
pub use builder::{
    build_unsigned_payout, estimate_payout_vsize, min_trade_amount, settlement_utxo, sign_payout,
    sign_settlement_input, SettlementSigner,
};
pub use derive::{derive_settlement_address, salt_key, salt_secret_key, SaltedKeys, Settlement};
pub use errors::*;
pub use fee::{allowed_fee_rate_min, fee_for_vsize};
pub use params::{SettlementPolicy, VerifyContext};
pub use payin::{verify_unsigned_payin, PayinVerification};
pub use payout::{
    verify_signed_payout, which_signature, PayoutSignatureType, PayoutVerification,
    PayoutVerifyRequest,
};
pub use result::TradeVerificationResult;
pub use script::{build_settlement_script, parse_multisig, script_to_address, SettlementScript};
pub use signed_payin::{verify_signed_payin, SignedPayinVerification};
pub use template::{PayinTemplate, Spender};
pub use utxo::{prevout_map, PrevoutMap, Utxo};
pub use verifier::{SignedInputState, TransactionVerifier, VerifierState, VerifyFlags};
