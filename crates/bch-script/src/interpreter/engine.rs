//! Execution core for standard transaction scripts.
//!
//! Supports the opcode set that standard output templates and their
//! unlocking scripts use. Anything outside that set fails with BadOpcode.

use bch_primitives::hash::{hash160, ripemd160, sha256, sha256d};

use crate::chunk::MAX_SCRIPT_ELEMENT_SIZE;
use crate::opcodes::*;
use crate::Script;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::stack::{as_bool, from_bool, peek, pop};
use super::SignatureChecker;

/// Maximum number of public keys in a CHECKMULTISIG.
const MAX_PUBKEYS_PER_MULTISIG: i64 = 20;

/// Execute one script against the given stack.
pub(super) fn eval(
    stack: &mut Vec<Vec<u8>>,
    script: &Script,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), InterpreterError> {
    let bytes = script.to_bytes();
    let mut pc = 0usize;
    let mut last_code_sep = 0usize;

    while pc < bytes.len() {
        let op = bytes[pc];

        if op <= OP_PUSHDATA4 {
            let (data, next_pc) = read_push(bytes, pc)?;
            if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::ElementTooBig,
                    format!("push of {} bytes exceeds {}", data.len(), MAX_SCRIPT_ELEMENT_SIZE),
                ));
            }
            if flags.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA) && !is_minimal_push(op, &data) {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::MinimalData,
                    "push is not minimally encoded".to_string(),
                ));
            }
            stack.push(data);
            pc = next_pc;
            continue;
        }

        pc += 1;
        match op {
            OP_1NEGATE => stack.push(vec![0x81]),
            _ if op >= OP_1 && op <= OP_16 => stack.push(vec![decode_op_n(op)]),

            OP_NOP => {}
            OP_NOP1 | OP_CHECKLOCKTIMEVERIFY | OP_CHECKSEQUENCEVERIFY | OP_NOP4 | OP_NOP5
            | OP_NOP6 | OP_NOP7 | OP_NOP8 | OP_NOP9 | OP_NOP10 => {
                if flags.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                    return Err(InterpreterError::new(
                        InterpreterErrorCode::DiscourageUpgradableNOPs,
                        format!("{} with discourage flag", opcode_to_string(op)),
                    ));
                }
            }

            OP_VERIFY => {
                let top = pop(stack)?;
                if !as_bool(&top) {
                    return Err(InterpreterError::new(
                        InterpreterErrorCode::Verify,
                        "OP_VERIFY failed".to_string(),
                    ));
                }
            }
            OP_RETURN => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::EarlyReturn,
                    "OP_RETURN in executed branch".to_string(),
                ));
            }

            OP_DUP => {
                let top = peek(stack, 0)?.clone();
                stack.push(top);
            }
            OP_DROP => {
                pop(stack)?;
            }
            OP_NIP => {
                let top = pop(stack)?;
                pop(stack)?;
                stack.push(top);
            }
            OP_OVER => {
                let item = peek(stack, 1)?.clone();
                stack.push(item);
            }
            OP_SWAP => {
                let a = pop(stack)?;
                let b = pop(stack)?;
                stack.push(a);
                stack.push(b);
            }

            OP_EQUAL | OP_EQUALVERIFY => {
                let a = pop(stack)?;
                let b = pop(stack)?;
                let equal = a == b;
                if op == OP_EQUAL {
                    stack.push(from_bool(equal));
                } else if !equal {
                    return Err(InterpreterError::new(
                        InterpreterErrorCode::EqualVerify,
                        "OP_EQUALVERIFY failed".to_string(),
                    ));
                }
            }

            OP_RIPEMD160 => {
                let buf = pop(stack)?;
                stack.push(ripemd160(&buf).to_vec());
            }
            OP_SHA256 => {
                let buf = pop(stack)?;
                stack.push(sha256(&buf).to_vec());
            }
            OP_HASH160 => {
                let buf = pop(stack)?;
                stack.push(hash160(&buf).to_vec());
            }
            OP_HASH256 => {
                let buf = pop(stack)?;
                stack.push(sha256d(&buf).to_vec());
            }

            OP_CODESEPARATOR => {
                last_code_sep = pc;
            }

            OP_CHECKSIG | OP_CHECKSIGVERIFY => {
                let script_code = Script::from_bytes(&bytes[last_code_sep..]);
                op_checksig(stack, flags, checker, &script_code, op == OP_CHECKSIGVERIFY)?;
            }
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                let script_code = Script::from_bytes(&bytes[last_code_sep..]);
                op_checkmultisig(
                    stack,
                    flags,
                    checker,
                    &script_code,
                    op == OP_CHECKMULTISIGVERIFY,
                )?;
            }

            _ => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::BadOpcode,
                    format!("{} (0x{:02x}) not supported", opcode_to_string(op), op),
                ));
            }
        }
    }

    Ok(())
}

/// Decode a push operation starting at `pos`; returns the data and the
/// position after the push.
fn read_push(bytes: &[u8], pos: usize) -> Result<(Vec<u8>, usize), InterpreterError> {
    let malformed = |what: &str| {
        InterpreterError::new(InterpreterErrorCode::MalformedPush, what.to_string())
    };
    let op = bytes[pos];

    let (length, data_start) = match op {
        OP_0 => (0usize, pos + 1),
        OP_PUSHDATA1 => {
            if bytes.len() < pos + 2 {
                return Err(malformed("truncated OP_PUSHDATA1 length"));
            }
            (bytes[pos + 1] as usize, pos + 2)
        }
        OP_PUSHDATA2 => {
            if bytes.len() < pos + 3 {
                return Err(malformed("truncated OP_PUSHDATA2 length"));
            }
            (
                u16::from_le_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize,
                pos + 3,
            )
        }
        OP_PUSHDATA4 => {
            if bytes.len() < pos + 5 {
                return Err(malformed("truncated OP_PUSHDATA4 length"));
            }
            (
                u32::from_le_bytes([bytes[pos + 1], bytes[pos + 2], bytes[pos + 3], bytes[pos + 4]])
                    as usize,
                pos + 5,
            )
        }
        _ => (op as usize, pos + 1),
    };

    if bytes.len() < data_start + length {
        return Err(malformed("push runs past end of script"));
    }
    Ok((bytes[data_start..data_start + length].to_vec(), data_start + length))
}

/// Check that pushed data used the smallest possible push opcode.
fn is_minimal_push(op: u8, data: &[u8]) -> bool {
    if data.is_empty() {
        return op == OP_0;
    }
    if data.len() == 1 && data[0] >= 1 && data[0] <= 16 {
        // Should have used OP_1 .. OP_16
        return false;
    }
    if data.len() == 1 && data[0] == 0x81 {
        // Should have used OP_1NEGATE
        return false;
    }
    if data.len() <= OP_DATA_75 as usize {
        return op as usize == data.len();
    }
    if data.len() <= 0xff {
        return op == OP_PUSHDATA1;
    }
    if data.len() <= 0xffff {
        return op == OP_PUSHDATA2;
    }
    op == OP_PUSHDATA4
}

/// Decode a small script number (CHECKMULTISIG operand).
///
/// Returns None if the encoding exceeds 4 bytes or, when `require_minimal`
/// is set, carries unnecessary padding.
fn decode_script_num(data: &[u8], require_minimal: bool) -> Option<i64> {
    if data.is_empty() {
        return Some(0);
    }
    if data.len() > 4 {
        return None;
    }
    if require_minimal {
        let last = data[data.len() - 1];
        if last & 0x7f == 0 && (data.len() == 1 || data[data.len() - 2] & 0x80 == 0) {
            return None;
        }
    }

    let mut result: i64 = 0;
    for (i, &b) in data.iter().enumerate() {
        result |= (b as i64) << (8 * i);
    }
    if data[data.len() - 1] & 0x80 != 0 {
        result &= !(0x80i64 << (8 * (data.len() - 1)));
        result = -result;
    }
    Some(result)
}

fn op_checksig(
    stack: &mut Vec<Vec<u8>>,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
    script_code: &Script,
    verify: bool,
) -> Result<(), InterpreterError> {
    let pk_bytes = pop(stack)?;
    let full_sig = pop(stack)?;

    let mut valid = false;
    if !full_sig.is_empty() {
        let shf = *full_sig.last().unwrap() as u32;
        check_hash_type_encoding(flags, shf)?;
        check_signature_encoding(flags, &full_sig[..full_sig.len() - 1])?;
        check_pub_key_encoding(flags, &pk_bytes)?;

        valid = checker.check_sig(&full_sig, &pk_bytes, script_code, flags);
        if !valid && flags.has_flag(ScriptFlags::VERIFY_NULL_FAIL) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NullFail,
                "signature not empty on failed checksig".to_string(),
            ));
        }
    }

    if verify {
        if !valid {
            return Err(InterpreterError::new(
                InterpreterErrorCode::CheckSigVerify,
                "OP_CHECKSIGVERIFY failed".to_string(),
            ));
        }
    } else {
        stack.push(from_bool(valid));
    }
    Ok(())
}

fn op_checkmultisig(
    stack: &mut Vec<Vec<u8>>,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
    script_code: &Script,
    verify: bool,
) -> Result<(), InterpreterError> {
    let require_minimal = flags.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA);

    let key_count_item = pop(stack)?;
    let num_pub_keys = decode_script_num(&key_count_item, require_minimal).ok_or_else(|| {
        InterpreterError::new(
            InterpreterErrorCode::InvalidPubKeyCount,
            "malformed pubkey count".to_string(),
        )
    })?;
    if num_pub_keys < 0 || num_pub_keys > MAX_PUBKEYS_PER_MULTISIG {
        return Err(InterpreterError::new(
            InterpreterErrorCode::InvalidPubKeyCount,
            format!("pubkey count {} out of range", num_pub_keys),
        ));
    }

    let mut pub_keys = Vec::with_capacity(num_pub_keys as usize);
    for _ in 0..num_pub_keys {
        pub_keys.push(pop(stack)?);
    }

    let sig_count_item = pop(stack)?;
    let num_signatures = decode_script_num(&sig_count_item, require_minimal).ok_or_else(|| {
        InterpreterError::new(
            InterpreterErrorCode::InvalidSignatureCount,
            "malformed signature count".to_string(),
        )
    })?;
    if num_signatures < 0 || num_signatures > num_pub_keys {
        return Err(InterpreterError::new(
            InterpreterErrorCode::InvalidSignatureCount,
            format!(
                "signature count {} out of range for {} keys",
                num_signatures, num_pub_keys
            ),
        ));
    }

    let mut signatures: Vec<Vec<u8>> = Vec::with_capacity(num_signatures as usize);
    for _ in 0..num_signatures {
        signatures.push(pop(stack)?);
    }

    // Dummy element (Satoshi bug)
    let dummy = pop(stack)?;
    if flags.has_flag(ScriptFlags::VERIFY_NULL_DUMMY) && !dummy.is_empty() {
        return Err(InterpreterError::new(
            InterpreterErrorCode::SigNullDummy,
            format!("multisig dummy argument has length {} instead of 0", dummy.len()),
        ));
    }

    let mut success = true;
    let mut remaining_keys = num_pub_keys + 1;
    let mut pub_key_idx: i64 = -1;
    let mut sig_idx: usize = 0;
    let mut remaining_sigs = num_signatures;

    while remaining_sigs > 0 {
        pub_key_idx += 1;
        remaining_keys -= 1;

        if remaining_sigs > remaining_keys {
            success = false;
            break;
        }

        let sig = &signatures[sig_idx];
        let pub_key = &pub_keys[pub_key_idx as usize];

        if sig.is_empty() {
            continue;
        }

        let shf = *sig.last().unwrap() as u32;
        check_hash_type_encoding(flags, shf)?;
        check_signature_encoding(flags, &sig[..sig.len() - 1])?;
        check_pub_key_encoding(flags, pub_key)?;

        if checker.check_sig(sig, pub_key, script_code, flags) {
            sig_idx += 1;
            remaining_sigs -= 1;
        }
    }

    if !success && flags.has_flag(ScriptFlags::VERIFY_NULL_FAIL) {
        for sig in &signatures {
            if !sig.is_empty() {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::NullFail,
                    "not all signatures empty on failed checkmultisig".to_string(),
                ));
            }
        }
    }

    if verify {
        if !success {
            return Err(InterpreterError::new(
                InterpreterErrorCode::CheckMultiSigVerify,
                "OP_CHECKMULTISIGVERIFY failed".to_string(),
            ));
        }
    } else {
        stack.push(from_bool(success));
    }
    Ok(())
}

/// Validate the sighash-type byte under VERIFY_STRICT_ENCODING.
pub(super) fn check_hash_type_encoding(
    flags: ScriptFlags,
    shf: u32,
) -> Result<(), InterpreterError> {
    if !flags.has_flag(ScriptFlags::VERIFY_STRICT_ENCODING) {
        return Ok(());
    }

    let sighash_forkid: u32 = 0x40;
    let sighash_anyonecanpay: u32 = 0x80;

    let base = shf & !(sighash_anyonecanpay | sighash_forkid);
    if base < 1 || base > 3 {
        return Err(InterpreterError::new(
            InterpreterErrorCode::InvalidSigHashType,
            format!("invalid hash type 0x{:x}", shf),
        ));
    }

    if flags.has_flag(ScriptFlags::ENABLE_SIGHASH_FORKID) {
        if shf & sighash_forkid == 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::IllegalForkID,
                "fork id sighash not set with flag".to_string(),
            ));
        }
    } else if shf & sighash_forkid != 0 {
        return Err(InterpreterError::new(
            InterpreterErrorCode::IllegalForkID,
            "fork id sighash set without flag".to_string(),
        ));
    }

    Ok(())
}

/// Validate public key encoding under VERIFY_STRICT_ENCODING.
pub(super) fn check_pub_key_encoding(
    flags: ScriptFlags,
    pub_key: &[u8],
) -> Result<(), InterpreterError> {
    if !flags.has_flag(ScriptFlags::VERIFY_STRICT_ENCODING) {
        return Ok(());
    }
    if pub_key.len() == 33 && (pub_key[0] == 0x02 || pub_key[0] == 0x03) {
        return Ok(());
    }
    if pub_key.len() == 65 && pub_key[0] == 0x04 {
        return Ok(());
    }
    Err(InterpreterError::new(
        InterpreterErrorCode::PubKeyType,
        "unsupported public key type".to_string(),
    ))
}

/// Validate signature DER structure and low-S under the DER/LOW_S/STRICT
/// encoding flags.
///
/// `sig` excludes the trailing sighash-type byte. An empty signature is
/// always acceptable here (it fails the actual check instead).
pub(super) fn check_signature_encoding(
    flags: ScriptFlags,
    sig: &[u8],
) -> Result<(), InterpreterError> {
    if !flags.has_any(&[
        ScriptFlags::VERIFY_DER_SIGNATURES,
        ScriptFlags::VERIFY_LOW_S,
        ScriptFlags::VERIFY_STRICT_ENCODING,
    ]) {
        return Ok(());
    }

    if sig.is_empty() {
        return Ok(());
    }

    let err = |code, what: &str| Err(InterpreterError::new(code, format!("malformed signature: {}", what)));

    let sig_len = sig.len();
    if sig_len < 8 {
        return err(InterpreterErrorCode::SigTooShort, "too short");
    }
    if sig_len > 72 {
        return err(InterpreterErrorCode::SigTooLong, "too long");
    }
    if sig[0] != 0x30 {
        return err(InterpreterErrorCode::SigInvalidSeqID, "wrong type marker");
    }
    if sig[1] as usize != sig_len - 2 {
        return err(InterpreterErrorCode::SigInvalidDataLen, "bad length");
    }

    let r_len = sig[3] as usize;
    let s_type_offset = 4 + r_len;
    let s_len_offset = s_type_offset + 1;

    if s_type_offset >= sig_len {
        return err(InterpreterErrorCode::SigMissingSTypeID, "S type indicator missing");
    }
    if s_len_offset >= sig_len {
        return err(InterpreterErrorCode::SigMissingSLen, "S length missing");
    }

    let s_offset = s_len_offset + 1;
    let s_len = sig[s_len_offset] as usize;
    if s_offset + s_len != sig_len {
        return err(InterpreterErrorCode::SigInvalidSLen, "invalid S length");
    }

    if sig[2] != 0x02 {
        return err(InterpreterErrorCode::SigInvalidRIntID, "R integer marker");
    }
    if r_len == 0 {
        return err(InterpreterErrorCode::SigZeroRLen, "R length is zero");
    }
    if sig[4] & 0x80 != 0 {
        return err(InterpreterErrorCode::SigNegativeR, "R is negative");
    }
    if r_len > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return err(InterpreterErrorCode::SigTooMuchRPadding, "R has too much padding");
    }

    if sig[s_type_offset] != 0x02 {
        return err(InterpreterErrorCode::SigInvalidSIntID, "S integer marker");
    }
    if s_len == 0 {
        return err(InterpreterErrorCode::SigZeroSLen, "S length is zero");
    }
    if sig[s_offset] & 0x80 != 0 {
        return err(InterpreterErrorCode::SigNegativeS, "S is negative");
    }
    if s_len > 1 && sig[s_offset] == 0x00 && sig[s_offset + 1] & 0x80 == 0 {
        return err(InterpreterErrorCode::SigTooMuchSPadding, "S has too much padding");
    }

    if flags.has_flag(ScriptFlags::VERIFY_LOW_S)
        && is_high_s(&sig[s_offset..s_offset + s_len])
    {
        return Err(InterpreterError::new(
            InterpreterErrorCode::SigHighS,
            "signature is not canonical due to unnecessarily high S value".to_string(),
        ));
    }

    Ok(())
}

/// Check whether a big-endian S value exceeds half the curve order.
fn is_high_s(s: &[u8]) -> bool {
    use bch_primitives::ec::signature::HALF_ORDER;

    // Strip DER zero padding
    let mut trimmed = s;
    while trimmed.len() > 1 && trimmed[0] == 0 {
        trimmed = &trimmed[1..];
    }
    if trimmed.len() > 32 {
        return true;
    }
    let mut padded = [0u8; 32];
    padded[32 - trimmed.len()..].copy_from_slice(trimmed);

    for i in 0..32 {
        if padded[i] > HALF_ORDER[i] {
            return true;
        }
        if padded[i] < HALF_ORDER[i] {
            return false;
        }
    }
    false // equal
}
