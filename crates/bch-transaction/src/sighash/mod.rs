//! Signature hash computation for transaction signing.
//!
//! Computes the digest that is signed by ECDSA to authorize spending a
//! transaction input. BCH uses the BIP-143-style sighash with the FORKID
//! bit for replay protection.

use bch_primitives::hash::sha256d;
use bch_primitives::util::{ByteWriter, VarInt};

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed
/// input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Replay-protection flag required on all BCH transactions after the UAHF
/// fork.
pub const SIGHASH_FORKID: u32 = 0x40;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// The standard BCH sighash type: ALL | FORKID.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// BIP-143 (FORKID) signature hash
// -----------------------------------------------------------------------

/// Compute the BIP-143-style signature hash for a given input.
///
/// This is the digest algorithm used by BCH when `sighash_type` includes
/// `SIGHASH_FORKID`. It commits to the value being spent and uses a
/// different serialization order than the legacy sighash.
///
/// # Arguments
/// * `tx`            - The transaction being signed.
/// * `input_index`   - Index of the input being signed.
/// * `script_code`   - The locking script (scriptCode) being satisfied.
/// * `sighash_type`  - Combined sighash flags (e.g. `SIGHASH_ALL_FORKID`).
/// * `satoshis`      - The satoshi value of the output being spent.
///
/// # Returns
/// A 32-byte double-SHA256 digest to be signed by ECDSA.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: u32,
    satoshis: u64,
) -> Result<[u8; 32], TransactionError> {
    let preimage = sighash_preimage(tx, input_index, script_code, sighash_type, satoshis)?;
    Ok(sha256d(&preimage))
}

/// Compute the pre-image bytes for the BIP-143-style sighash before
/// double-hashing.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - sha256d of all outpoints unless ANYONECANPAY
/// 3. hashSequence (32 bytes) - sha256d of all sequences unless
///    ANYONECANPAY/SINGLE/NONE
/// 4. outpoint (32+4 bytes) - txid + vout of the input being signed
/// 5. scriptCode (varint + script) - the locking script being satisfied
/// 6. value (8 bytes LE) - satoshis of the output being spent
/// 7. nSequence (4 bytes LE) - sequence of the input being signed
/// 8. hashOutputs (32 bytes) - sha256d of all outputs or one output
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
///
/// # Arguments
/// * `tx`            - The transaction being signed.
/// * `input_index`   - Index of the input being signed.
/// * `script_code`   - The locking script being satisfied.
/// * `sighash_type`  - The combined sighash flags.
/// * `satoshis`      - The satoshi value of the output being spent.
///
/// # Returns
/// The raw preimage bytes (not yet hashed).
pub fn sighash_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: u32,
    satoshis: u64,
) -> Result<Vec<u8>, TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let input = &tx.inputs[input_index];
    let base_type = sighash_type & SIGHASH_MASK;

    let hash_prevouts = if sighash_type & SIGHASH_ANYONECANPAY == 0 {
        prevouts_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_sequence = if sighash_type & SIGHASH_ANYONECANPAY == 0
        && base_type != SIGHASH_SINGLE
        && base_type != SIGHASH_NONE
    {
        sequences_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_outputs = if base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        outputs_hash(tx, None)
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        outputs_hash(tx, Some(input_index))
    } else {
        [0u8; 32]
    };

    let mut writer = ByteWriter::with_capacity(156 + script_code.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    writer.write_bytes(&input.source_txid);
    writer.write_u32_le(input.source_tx_out_index);
    writer.write_varint(VarInt::from(script_code.len()));
    writer.write_bytes(script_code);
    writer.write_u64_le(satoshis);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);

    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

/// Double-SHA256 of all input outpoints concatenated
/// (txid + vout, 36 bytes each).
fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        writer.write_bytes(&input.source_txid);
        writer.write_u32_le(input.source_tx_out_index);
    }
    sha256d(writer.as_bytes())
}

/// Double-SHA256 of all input sequence numbers concatenated (4 bytes each).
fn sequences_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// Double-SHA256 of serialized outputs.
///
/// If `only` is `None`, all outputs are included; otherwise only the output
/// at that index (used for SIGHASH_SINGLE).
fn outputs_hash(tx: &Transaction, only: Option<usize>) -> [u8; 32] {
    let mut writer = ByteWriter::new();
    match only {
        None => {
            for output in &tx.outputs {
                writer.write_bytes(&output.to_bytes());
            }
        }
        Some(n) => writer.write_bytes(&tx.outputs[n].to_bytes()),
    }
    sha256d(writer.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TransactionInput;
    use crate::output::TransactionOutput;
    use bch_script::Script;

    fn two_in_two_out() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(TransactionInput::spending([0x01; 32], 0));
        tx.add_input(TransactionInput::spending([0x02; 32], 1));
        tx.add_output(TransactionOutput::locking(
            10_000,
            Script::from_hex("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap(),
        ));
        tx.add_output(TransactionOutput::locking(
            20_000,
            Script::from_hex("a9149de5aeaff9c48431ba4dd6e8af73d51f38e451cb87").unwrap(),
        ));
        tx
    }

    /// Verify the preimage layout: version prefix, sighash type suffix, and
    /// committed amount.
    #[test]
    fn test_preimage_layout() {
        let tx = two_in_two_out();
        let script_code =
            hex::decode("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();
        let preimage =
            sighash_preimage(&tx, 0, &script_code, SIGHASH_ALL_FORKID, 123_456).unwrap();

        // version
        assert_eq!(&preimage[..4], &1u32.to_le_bytes());
        // sighash type trailer
        assert_eq!(&preimage[preimage.len() - 4..], &0x41u32.to_le_bytes());
        // outpoint of input 0 follows the two 32-byte hashes
        assert_eq!(&preimage[68..100], &[0x01; 32]);
        // committed satoshi amount after outpoint + varint + script code
        let amount_offset = 100 + 4 + 1 + script_code.len();
        assert_eq!(
            &preimage[amount_offset..amount_offset + 8],
            &123_456u64.to_le_bytes()
        );
    }

    /// Verify the digest changes with the input index, amount, and sighash
    /// type.
    #[test]
    fn test_digest_sensitivity() {
        let tx = two_in_two_out();
        let script_code =
            hex::decode("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();

        let base = signature_hash(&tx, 0, &script_code, SIGHASH_ALL_FORKID, 1000).unwrap();
        let other_input =
            signature_hash(&tx, 1, &script_code, SIGHASH_ALL_FORKID, 1000).unwrap();
        let other_amount =
            signature_hash(&tx, 0, &script_code, SIGHASH_ALL_FORKID, 1001).unwrap();
        let other_type = signature_hash(
            &tx,
            0,
            &script_code,
            SIGHASH_NONE | SIGHASH_FORKID,
            1000,
        )
        .unwrap();

        assert_ne!(base, other_input);
        assert_ne!(base, other_amount);
        assert_ne!(base, other_type);
    }

    /// Verify ANYONECANPAY zeroes the prevouts and sequence commitments.
    #[test]
    fn test_anyonecanpay_zeroes_commitments() {
        let tx = two_in_two_out();
        let script_code =
            hex::decode("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();
        let preimage = sighash_preimage(
            &tx,
            0,
            &script_code,
            SIGHASH_ALL_FORKID | SIGHASH_ANYONECANPAY,
            1000,
        )
        .unwrap();
        assert_eq!(&preimage[4..36], &[0u8; 32]);
        assert_eq!(&preimage[36..68], &[0u8; 32]);
    }

    /// Verify an out-of-range input index is rejected.
    #[test]
    fn test_input_index_out_of_range() {
        let tx = two_in_two_out();
        assert!(signature_hash(&tx, 2, &[], SIGHASH_ALL_FORKID, 0).is_err());
    }

    /// Verify SIGHASH_SINGLE commits to only the matching output.
    #[test]
    fn test_sighash_single() {
        let mut tx = two_in_two_out();
        let script_code =
            hex::decode("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();
        let single = SIGHASH_SINGLE | SIGHASH_FORKID;

        let base = signature_hash(&tx, 0, &script_code, single, 1000).unwrap();
        // Changing the other output does not affect the digest
        tx.outputs[1].satoshis += 1;
        let changed_other = signature_hash(&tx, 0, &script_code, single, 1000).unwrap();
        assert_eq!(base, changed_other);
        // Changing the matching output does
        tx.outputs[0].satoshis += 1;
        let changed_own = signature_hash(&tx, 0, &script_code, single, 1000).unwrap();
        assert_ne!(base, changed_own);
    }
}
