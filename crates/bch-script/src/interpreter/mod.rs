//! Verification engine for standard transaction scripts.
//!
//! Executes unlocking and locking scripts to verify transaction inputs,
//! covering the opcodes that standard output templates use, plus P2SH
//! subscript evaluation and the policy/consensus flag checks around them.
//!
//! # Architecture
//!
//! The engine does not depend on the transaction crate. Callers provide a
//! [`SignatureChecker`] implementation that binds signature verification to
//! a transaction, input index, and amount; the engine feeds it every
//! signature/pubkey pair that OP_CHECKSIG and OP_CHECKMULTISIG encounter.
//!
//! # Example
//!
//! ```ignore
//! use bch_script::interpreter::{verify_script, NullSignatureChecker, ScriptFlags};
//!
//! verify_script(
//!     &unlocking_script,
//!     &locking_script,
//!     ScriptFlags::STANDARD_VERIFY_FLAGS,
//!     &my_checker,
//! )?;
//! ```

mod engine;
pub mod error;
pub mod flags;
pub mod stack;

pub use error::{InterpreterError, InterpreterErrorCode};
pub use flags::ScriptFlags;
pub use stack::{as_bool, from_bool};

use crate::Script;
use error::InterpreterErrorCode as Code;

/// Signature checking capability used by OP_CHECKSIG and OP_CHECKMULTISIG.
///
/// Implementors bind verification to a transaction context. `full_sig`
/// includes the trailing sighash-type byte; `script_code` is the portion of
/// the executing script the signature commits to.
pub trait SignatureChecker {
    /// Verify a signature against a public key for the bound input.
    ///
    /// Returns `true` if the signature is valid.
    fn check_sig(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        script_code: &Script,
        flags: ScriptFlags,
    ) -> bool;
}

/// A checker that rejects every signature.
///
/// Used to evaluate push-only scripts where no signature check can occur,
/// such as recovering a scriptSig's stack.
pub struct NullSignatureChecker;

impl SignatureChecker for NullSignatureChecker {
    fn check_sig(
        &self,
        _full_sig: &[u8],
        _pub_key: &[u8],
        _script_code: &Script,
        _flags: ScriptFlags,
    ) -> bool {
        false
    }
}

/// Execute a script, leaving its result stack in `stack`.
///
/// The stack may carry items from a previous evaluation (the scriptSig's
/// output when evaluating a scriptPubKey). On error the stack holds
/// whatever had accumulated before the failure.
///
/// # Arguments
/// * `stack` - The data stack to execute against.
/// * `script` - The script to execute.
/// * `flags` - Verification flags.
/// * `checker` - Signature checker for checksig operations.
///
/// # Returns
/// `Ok(())` if execution completed, or the failure.
pub fn eval_script(
    stack: &mut Vec<Vec<u8>>,
    script: &Script,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), InterpreterError> {
    engine::eval(stack, script, flags, checker)
}

/// Verify that an unlocking script satisfies a locking script.
///
/// Evaluates the scriptSig, then the scriptPubKey on the resulting stack,
/// requiring a truthy top element. For P2SH outputs the redeem script is
/// popped from the scriptSig's stack and evaluated in turn. Enforces the
/// push-only and clean-stack policies when the corresponding flags are set.
///
/// # Arguments
/// * `script_sig` - The unlocking script.
/// * `script_pubkey` - The locking script.
/// * `flags` - Verification flags.
/// * `checker` - Signature checker for checksig operations.
///
/// # Returns
/// `Ok(())` if the scripts verify, or the failure.
pub fn verify_script(
    script_sig: &Script,
    script_pubkey: &Script,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), InterpreterError> {
    if flags.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) && !flags.has_flag(ScriptFlags::VERIFY_P2SH)
    {
        return Err(InterpreterError::new(
            Code::InvalidFlags,
            "clean stack requires P2SH evaluation".to_string(),
        ));
    }
    if flags.has_flag(ScriptFlags::VERIFY_SIG_PUSH_ONLY) && !script_sig.is_push_only() {
        return Err(InterpreterError::new(
            Code::NotPushOnly,
            "scriptSig is not push only".to_string(),
        ));
    }

    let mut stack: Vec<Vec<u8>> = Vec::new();
    eval_script(&mut stack, script_sig, flags, checker)?;
    let stack_copy = if flags.has_flag(ScriptFlags::VERIFY_P2SH) {
        stack.clone()
    } else {
        Vec::new()
    };
    eval_script(&mut stack, script_pubkey, flags, checker)?;

    match stack.last() {
        Some(top) if as_bool(top) => {}
        _ => {
            return Err(InterpreterError::new(
                Code::EvalFalse,
                "script evaluated without top stack element being true".to_string(),
            ));
        }
    }

    // One level of P2SH indirection.
    if flags.has_flag(ScriptFlags::VERIFY_P2SH) && script_pubkey.is_p2sh() {
        // scriptSig must be literal pushes for the redeem script to be
        // well defined.
        if !script_sig.is_push_only() {
            return Err(InterpreterError::new(
                Code::NotPushOnly,
                "P2SH scriptSig is not push only".to_string(),
            ));
        }

        let mut stack = stack_copy;
        let redeem_bytes = stack.pop().ok_or_else(|| {
            InterpreterError::new(
                Code::InvalidStackOperation,
                "P2SH scriptSig left an empty stack".to_string(),
            )
        })?;
        let redeem_script = Script::from_bytes(&redeem_bytes);

        eval_script(&mut stack, &redeem_script, flags, checker)?;
        match stack.last() {
            Some(top) if as_bool(top) => {}
            _ => {
                return Err(InterpreterError::new(
                    Code::EvalFalse,
                    "redeem script evaluated without top stack element being true".to_string(),
                ));
            }
        }

        if flags.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) && stack.len() != 1 {
            return Err(InterpreterError::new(
                Code::CleanStack,
                format!("{} stack elements left after P2SH evaluation", stack.len()),
            ));
        }
        return Ok(());
    }

    if flags.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) && stack.len() != 1 {
        return Err(InterpreterError::new(
            Code::CleanStack,
            format!("{} stack elements left after evaluation", stack.len()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::*;

    fn verify(unlock: &Script, lock: &Script, flags: ScriptFlags) -> Result<(), InterpreterError> {
        verify_script(unlock, lock, flags, &NullSignatureChecker)
    }

    #[test]
    fn test_push_equal() {
        // unlocking: OP_1, locking: OP_1 OP_EQUAL
        let unlock = Script::from_bytes(&[OP_1]);
        let lock = Script::from_bytes(&[OP_1, OP_EQUAL]);
        assert!(verify(&unlock, &lock, ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_push_not_equal_fails() {
        let unlock = Script::from_bytes(&[OP_1]);
        let lock = Script::from_bytes(&[OP_2, OP_EQUAL]);
        let result = verify(&unlock, &lock, ScriptFlags::NONE);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::EvalFalse);
    }

    #[test]
    fn test_hash160_equalverify() {
        // Hash-lock shaped like the front half of P2PKH
        let preimage = vec![0xaa; 16];
        let hash = bch_primitives::hash::hash160(&preimage);

        let mut unlock = Script::new();
        unlock.append_push_data(&preimage).unwrap();

        let mut lock = Script::new();
        lock.append_opcodes(&[OP_DUP, OP_HASH160]).unwrap();
        lock.append_push_data(&hash).unwrap();
        lock.append_opcodes(&[OP_EQUALVERIFY, OP_HASH160]).unwrap();
        lock.append_push_data(&bch_primitives::hash::hash160(&preimage)).unwrap();
        lock.append_opcodes(&[OP_EQUAL]).unwrap();

        assert!(verify(&unlock, &lock, ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_return_fails() {
        let unlock = Script::from_bytes(&[OP_1]);
        let lock = Script::from_bytes(&[OP_RETURN]);
        let result = verify(&unlock, &lock, ScriptFlags::NONE);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::EarlyReturn);
    }

    #[test]
    fn test_op_verify_fail() {
        let unlock = Script::from_bytes(&[OP_0]);
        let lock = Script::from_bytes(&[OP_VERIFY, OP_1]);
        let result = verify(&unlock, &lock, ScriptFlags::NONE);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::Verify);
    }

    #[test]
    fn test_unsupported_opcode() {
        let unlock = Script::from_bytes(&[OP_1, OP_1]);
        let lock = Script::from_bytes(&[OP_IF, OP_1, OP_ENDIF]);
        let result = verify(&unlock, &lock, ScriptFlags::NONE);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::BadOpcode);
    }

    #[test]
    fn test_minimal_data_enforced() {
        // Pushing [0x01] with a direct push instead of OP_1
        let unlock = Script::from_bytes(&[0x01, 0x01]);
        let lock = Script::from_bytes(&[OP_1, OP_EQUAL]);
        assert!(verify(&unlock, &lock, ScriptFlags::NONE).is_ok());
        let result = verify(&unlock, &lock, ScriptFlags::VERIFY_MINIMAL_DATA);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::MinimalData);
    }

    #[test]
    fn test_sig_push_only_flag() {
        let unlock = Script::from_bytes(&[OP_1, OP_DUP]);
        let lock = Script::from_bytes(&[OP_EQUAL]);
        assert!(verify(&unlock, &lock, ScriptFlags::NONE).is_ok());
        let result = verify(&unlock, &lock, ScriptFlags::VERIFY_SIG_PUSH_ONLY);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::NotPushOnly);
    }

    #[test]
    fn test_clean_stack_requires_p2sh() {
        let result = verify(
            &Script::from_bytes(&[OP_1]),
            &Script::from_bytes(&[OP_1]),
            ScriptFlags::VERIFY_CLEAN_STACK,
        );
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::InvalidFlags);
    }

    #[test]
    fn test_clean_stack() {
        let flags = ScriptFlags::VERIFY_CLEAN_STACK | ScriptFlags::VERIFY_P2SH;
        // Two leftover elements fail
        let result = verify(
            &Script::from_bytes(&[OP_1, OP_1]),
            &Script::new(),
            flags,
        );
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::CleanStack);
        // Exactly one passes
        assert!(verify(&Script::from_bytes(&[OP_1]), &Script::new(), flags).is_ok());
    }

    #[test]
    fn test_p2sh_redeem_evaluation() {
        // Redeem script: OP_2 OP_EQUAL; scriptSig pushes OP_2 then the
        // serialized redeem script.
        let redeem = Script::from_bytes(&[OP_2, OP_EQUAL]);
        let mut lock = Script::new();
        lock.append_opcodes(&[OP_HASH160]).unwrap();
        lock.append_push_data(redeem.script_id().as_bytes()).unwrap();
        lock.append_opcodes(&[OP_EQUAL]).unwrap();
        assert!(lock.is_p2sh());

        let mut unlock = Script::new();
        unlock.append_opcodes(&[OP_2]).unwrap();
        unlock.append_push_data(redeem.to_bytes()).unwrap();

        let flags = ScriptFlags::VERIFY_P2SH | ScriptFlags::VERIFY_CLEAN_STACK;
        assert!(verify(&unlock, &lock, flags).is_ok());

        // Wrong inner value fails inside the redeem script
        let mut bad_unlock = Script::new();
        bad_unlock.append_opcodes(&[OP_3]).unwrap();
        bad_unlock.append_push_data(redeem.to_bytes()).unwrap();
        assert!(verify(&bad_unlock, &lock, flags).is_err());
    }

    #[test]
    fn test_empty_scripts_fail() {
        let result = verify(&Script::new(), &Script::new(), ScriptFlags::NONE);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::EvalFalse);
    }

    #[test]
    fn test_discourage_upgradable_nops() {
        let unlock = Script::from_bytes(&[OP_1]);
        let lock = Script::from_bytes(&[OP_NOP1, OP_1, OP_DROP]);
        assert!(verify(&unlock, &lock, ScriptFlags::NONE).is_ok());
        let result = verify(&unlock, &lock, ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().code,
            InterpreterErrorCode::DiscourageUpgradableNOPs
        );
    }

    #[test]
    fn test_null_dummy() {
        // A failing standalone CHECKMULTISIG invocation with a non-empty dummy
        let unlock = Script::from_bytes(&[OP_1, OP_0, OP_0, OP_CHECKMULTISIG]);
        let result = verify(&unlock, &Script::new(), ScriptFlags::VERIFY_NULL_DUMMY);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::SigNullDummy);
    }

    #[test]
    fn test_hash_type_encoding() {
        use super::engine::check_hash_type_encoding;
        let strict =
            ScriptFlags::VERIFY_STRICT_ENCODING | ScriptFlags::ENABLE_SIGHASH_FORKID;

        // ALL | FORKID passes
        assert!(check_hash_type_encoding(strict, 0x41).is_ok());
        // Missing forkid fails
        let result = check_hash_type_encoding(strict, 0x01);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::IllegalForkID);
        // Invalid base type fails
        let result = check_hash_type_encoding(strict, 0x44);
        assert_eq!(
            result.unwrap_err().code,
            InterpreterErrorCode::InvalidSigHashType
        );
        // No strict flag accepts anything
        assert!(check_hash_type_encoding(ScriptFlags::NONE, 0x44).is_ok());
    }

    #[test]
    fn test_signature_encoding_checks() {
        use super::engine::check_signature_encoding;
        let flags = ScriptFlags::VERIFY_DER_SIGNATURES;

        // The dummy DER skeleton used for fee estimation must pass.
        let mut dummy = vec![0u8; 71];
        dummy[0] = 0x30;
        dummy[1] = 69;
        dummy[2] = 0x02;
        dummy[3] = 33;
        dummy[4] = 0x01;
        dummy[4 + 33] = 0x02;
        dummy[5 + 33] = 32;
        dummy[6 + 33] = 0x01;
        assert!(check_signature_encoding(flags, &dummy).is_ok());
        assert!(check_signature_encoding(
            flags | ScriptFlags::VERIFY_LOW_S,
            &dummy
        )
        .is_ok());

        // Empty is acceptable
        assert!(check_signature_encoding(flags, &[]).is_ok());

        // Wrong marker fails
        let mut bad = dummy.clone();
        bad[0] = 0x31;
        assert!(check_signature_encoding(flags, &bad).is_err());

        // Too short fails
        assert!(check_signature_encoding(flags, &[0x30, 0x01, 0x02]).is_err());
    }
}
