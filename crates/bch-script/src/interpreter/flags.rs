//! Script verification flags (bitmask).

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling verification behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    /// No flags set.
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate P2SH (BIP16) subscripts.
    pub const VERIFY_P2SH: ScriptFlags = ScriptFlags(1 << 0);
    /// Enforce strict multisig dummy element (must be empty).
    pub const VERIFY_NULL_DUMMY: ScriptFlags = ScriptFlags(1 << 1);
    /// Discourage use of upgradable NOP opcodes (NOP1-NOP10).
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 2);
    /// Require exactly one element on the stack after execution.
    pub const VERIFY_CLEAN_STACK: ScriptFlags = ScriptFlags(1 << 3);
    /// Require strict DER encoding for signatures.
    pub const VERIFY_DER_SIGNATURES: ScriptFlags = ScriptFlags(1 << 4);
    /// Require the S value in signatures to be in the lower half of the
    /// curve order.
    pub const VERIFY_LOW_S: ScriptFlags = ScriptFlags(1 << 5);
    /// Require minimal encoding for data pushes.
    pub const VERIFY_MINIMAL_DATA: ScriptFlags = ScriptFlags(1 << 6);
    /// Require failed CHECK(MULTI)SIG operations to have empty signatures.
    pub const VERIFY_NULL_FAIL: ScriptFlags = ScriptFlags(1 << 7);
    /// Require the unlocking script to contain only push opcodes.
    pub const VERIFY_SIG_PUSH_ONLY: ScriptFlags = ScriptFlags(1 << 8);
    /// Enable SIGHASH_FORKID replay protection (BCH-specific).
    pub const ENABLE_SIGHASH_FORKID: ScriptFlags = ScriptFlags(1 << 9);
    /// Require strict signature and public key encoding.
    pub const VERIFY_STRICT_ENCODING: ScriptFlags = ScriptFlags(1 << 10);

    /// Flags every relayed transaction must satisfy on this chain.
    pub const MANDATORY_VERIFY_FLAGS: ScriptFlags = ScriptFlags(
        Self::VERIFY_P2SH.0
            | Self::VERIFY_STRICT_ENCODING.0
            | Self::ENABLE_SIGHASH_FORKID.0
            | Self::VERIFY_LOW_S.0
            | Self::VERIFY_NULL_FAIL.0,
    );

    /// The policy flag set used for standard-transaction verification,
    /// including the final scriptSig verification after signing.
    pub const STANDARD_VERIFY_FLAGS: ScriptFlags = ScriptFlags(
        Self::MANDATORY_VERIFY_FLAGS.0
            | Self::VERIFY_DER_SIGNATURES.0
            | Self::VERIFY_MINIMAL_DATA.0
            | Self::VERIFY_NULL_DUMMY.0
            | Self::VERIFY_SIG_PUSH_ONLY.0
            | Self::VERIFY_CLEAN_STACK.0
            | Self::DISCOURAGE_UPGRADABLE_NOPS.0,
    );

    /// Return true if the given flag is set in this flags value.
    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Return true if any of the given flags are set in this flags value.
    pub fn has_any(self, flags: &[ScriptFlags]) -> bool {
        flags.iter().any(|f| self.has_flag(*f))
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}
