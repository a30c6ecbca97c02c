use bitcoin::{
    ecdsa,
    hashes::Hash,
    script::{Builder, PushBytesBuf},
    secp256k1::{Message, SECP256K1},
    sighash::{EcdsaSighashType, SighashCache},
    Amount, Transaction, Witness,
};

use crate::TestKey;

/// Signs a native segwit input with `SIGHASH_ALL` and installs the witness.
pub fn sign_p2wpkh_input(
    tx: &mut Transaction,
    input_index: usize,
    key: &TestKey,
    value: Amount,
) -> anyhow::Result<()> {
    let sig = sign_wpkh_program(tx, input_index, key, value)?;
    tx.input[input_index].witness = p2wpkh_witness(&sig, key);
    Ok(())
}

/// Signs a nested segwit input, installing both the redeem script push and the witness.
pub fn sign_p2sh_p2wpkh_input(
    tx: &mut Transaction,
    input_index: usize,
    key: &TestKey,
    value: Amount,
) -> anyhow::Result<()> {
    let sig = sign_wpkh_program(tx, input_index, key, value)?;
    let redeem = PushBytesBuf::try_from(key.nested_redeem_script().into_bytes())?;
    tx.input[input_index].script_sig = Builder::new().push_slice(redeem).into_script();
    tx.input[input_index].witness = p2wpkh_witness(&sig, key);
    Ok(())
}

fn sign_wpkh_program(
    tx: &Transaction,
    input_index: usize,
    key: &TestKey,
    value: Amount,
) -> anyhow::Result<ecdsa::Signature> {
    let mut cache = SighashCache::new(tx);
    let sighash = cache.p2wpkh_signature_hash(
        input_index,
        &key.p2wpkh_script(),
        value,
        EcdsaSighashType::All,
    )?;
    let msg = Message::from_digest(sighash.to_byte_array());
    Ok(ecdsa::Signature {
        signature: SECP256K1.sign_ecdsa(&msg, &key.secret),
        sighash_type: EcdsaSighashType::All,
    })
}

fn p2wpkh_witness(sig: &ecdsa::Signature, key: &TestKey) -> Witness {
    let mut witness = Witness::new();
    witness.push(sig.to_vec());
    witness.push(key.public.serialize());
    witness
}
