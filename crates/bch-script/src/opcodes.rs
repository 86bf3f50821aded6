//! Bitcoin script opcode constants and name mappings.
//!
//! Defines the opcode byte values used by the SDK plus helpers to map
//! between opcode bytes and their canonical `OP_xxx` names for ASM output
//! and parsing.

// -----------------------------------------------------------------------
// Push value
// -----------------------------------------------------------------------

/// Push an empty byte array onto the stack.
pub const OP_0: u8 = 0x00;
/// Alias for OP_0.
pub const OP_FALSE: u8 = 0x00;
/// Smallest direct data push (1 byte).
pub const OP_DATA_1: u8 = 0x01;
/// Direct push of 20 bytes (key and script hashes).
pub const OP_DATA_20: u8 = 0x14;
/// Direct push of 33 bytes (compressed public keys).
pub const OP_DATA_33: u8 = 0x21;
/// Direct push of 65 bytes (uncompressed public keys).
pub const OP_DATA_65: u8 = 0x41;
/// Largest direct data push (75 bytes).
pub const OP_DATA_75: u8 = 0x4b;
/// The next byte holds the push length.
pub const OP_PUSHDATA1: u8 = 0x4c;
/// The next two bytes (LE) hold the push length.
pub const OP_PUSHDATA2: u8 = 0x4d;
/// The next four bytes (LE) hold the push length.
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number -1 onto the stack.
pub const OP_1NEGATE: u8 = 0x4f;
/// Reserved opcode.
pub const OP_RESERVED: u8 = 0x50;
/// Push the number 1 onto the stack.
pub const OP_1: u8 = 0x51;
/// Alias for OP_1.
pub const OP_TRUE: u8 = 0x51;
/// Push the number 2 onto the stack.
pub const OP_2: u8 = 0x52;
/// Push the number 3 onto the stack.
pub const OP_3: u8 = 0x53;
/// Push the number 4 onto the stack.
pub const OP_4: u8 = 0x54;
/// Push the number 5 onto the stack.
pub const OP_5: u8 = 0x55;
/// Push the number 6 onto the stack.
pub const OP_6: u8 = 0x56;
/// Push the number 7 onto the stack.
pub const OP_7: u8 = 0x57;
/// Push the number 8 onto the stack.
pub const OP_8: u8 = 0x58;
/// Push the number 9 onto the stack.
pub const OP_9: u8 = 0x59;
/// Push the number 10 onto the stack.
pub const OP_10: u8 = 0x5a;
/// Push the number 11 onto the stack.
pub const OP_11: u8 = 0x5b;
/// Push the number 12 onto the stack.
pub const OP_12: u8 = 0x5c;
/// Push the number 13 onto the stack.
pub const OP_13: u8 = 0x5d;
/// Push the number 14 onto the stack.
pub const OP_14: u8 = 0x5e;
/// Push the number 15 onto the stack.
pub const OP_15: u8 = 0x5f;
/// Push the number 16 onto the stack.
pub const OP_16: u8 = 0x60;

// -----------------------------------------------------------------------
// Flow control
// -----------------------------------------------------------------------

/// Do nothing.
pub const OP_NOP: u8 = 0x61;
/// Reserved.
pub const OP_VER: u8 = 0x62;
/// Conditional execution: begin if-branch.
pub const OP_IF: u8 = 0x63;
/// Conditional execution: begin if-not-branch.
pub const OP_NOTIF: u8 = 0x64;
/// Reserved conditional.
pub const OP_VERIF: u8 = 0x65;
/// Reserved conditional.
pub const OP_VERNOTIF: u8 = 0x66;
/// Conditional execution: else-branch.
pub const OP_ELSE: u8 = 0x67;
/// Conditional execution: end.
pub const OP_ENDIF: u8 = 0x68;
/// Fail unless the top stack value is true; consumes it.
pub const OP_VERIFY: u8 = 0x69;
/// Mark the output as unspendable (data carrier).
pub const OP_RETURN: u8 = 0x6a;

// -----------------------------------------------------------------------
// Stack
// -----------------------------------------------------------------------

/// Remove the top stack item.
pub const OP_DROP: u8 = 0x75;
/// Duplicate the top stack item.
pub const OP_DUP: u8 = 0x76;
/// Remove the second-to-top stack item.
pub const OP_NIP: u8 = 0x77;
/// Copy the second-to-top stack item to the top.
pub const OP_OVER: u8 = 0x78;
/// Swap the top two stack items.
pub const OP_SWAP: u8 = 0x7c;

// -----------------------------------------------------------------------
// Bitwise logic
// -----------------------------------------------------------------------

/// Push 1 if the top two items are exactly equal, 0 otherwise.
pub const OP_EQUAL: u8 = 0x87;
/// Same as OP_EQUAL followed by OP_VERIFY.
pub const OP_EQUALVERIFY: u8 = 0x88;

// -----------------------------------------------------------------------
// Crypto
// -----------------------------------------------------------------------

/// Hash the top item with RIPEMD-160.
pub const OP_RIPEMD160: u8 = 0xa6;
/// Hash the top item with SHA-1.
pub const OP_SHA1: u8 = 0xa7;
/// Hash the top item with SHA-256.
pub const OP_SHA256: u8 = 0xa8;
/// Hash the top item with RIPEMD-160(SHA-256(x)).
pub const OP_HASH160: u8 = 0xa9;
/// Hash the top item with SHA-256(SHA-256(x)).
pub const OP_HASH256: u8 = 0xaa;
/// All signature-checking words only match signatures to data after this.
pub const OP_CODESEPARATOR: u8 = 0xab;
/// Verify an ECDSA signature against a public key.
pub const OP_CHECKSIG: u8 = 0xac;
/// Same as OP_CHECKSIG followed by OP_VERIFY.
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
/// Verify m-of-n ECDSA signatures.
pub const OP_CHECKMULTISIG: u8 = 0xae;
/// Same as OP_CHECKMULTISIG followed by OP_VERIFY.
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

// -----------------------------------------------------------------------
// Expansion
// -----------------------------------------------------------------------

/// Upgradable no-op.
pub const OP_NOP1: u8 = 0xb0;
/// BIP65 absolute lock-time check (upgradable no-op here).
pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
/// BIP112 relative lock-time check (upgradable no-op here).
pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;
/// Upgradable no-op.
pub const OP_NOP4: u8 = 0xb3;
/// Upgradable no-op.
pub const OP_NOP5: u8 = 0xb4;
/// Upgradable no-op.
pub const OP_NOP6: u8 = 0xb5;
/// Upgradable no-op.
pub const OP_NOP7: u8 = 0xb6;
/// Upgradable no-op.
pub const OP_NOP8: u8 = 0xb7;
/// Upgradable no-op.
pub const OP_NOP9: u8 = 0xb8;
/// Upgradable no-op.
pub const OP_NOP10: u8 = 0xb9;

/// Check whether an opcode directly pushes a small integer
/// (OP_0 or OP_1 through OP_16).
///
/// # Arguments
/// * `op` - The opcode byte.
///
/// # Returns
/// `true` for OP_0 and OP_1..OP_16.
pub fn is_small_int_op(op: u8) -> bool {
    op == OP_0 || (op >= OP_1 && op <= OP_16)
}

/// Return the opcode that pushes the small integer `n`.
///
/// # Arguments
/// * `n` - A value in `1..=16`.
///
/// # Returns
/// The corresponding OP_1..OP_16 byte. Values outside the range map to OP_0.
pub fn encode_op_n(n: u8) -> u8 {
    if n == 0 || n > 16 {
        return OP_0;
    }
    OP_1 + n - 1
}

/// Return the small integer pushed by an OP_N opcode.
///
/// # Arguments
/// * `op` - An OP_0 or OP_1..OP_16 opcode byte.
///
/// # Returns
/// The value 0..=16.
pub fn decode_op_n(op: u8) -> u8 {
    if op == OP_0 {
        return 0;
    }
    op - OP_1 + 1
}

/// Map an opcode byte to its canonical `OP_xxx` name.
///
/// # Arguments
/// * `op` - The opcode byte.
///
/// # Returns
/// The canonical name, or `"OP_UNKNOWN"` for bytes this SDK does not name.
pub fn opcode_to_string(op: u8) -> &'static str {
    match op {
        OP_0 => "OP_FALSE",
        OP_PUSHDATA1 => "OP_PUSHDATA1",
        OP_PUSHDATA2 => "OP_PUSHDATA2",
        OP_PUSHDATA4 => "OP_PUSHDATA4",
        OP_1NEGATE => "OP_1NEGATE",
        OP_RESERVED => "OP_RESERVED",
        OP_1 => "OP_1",
        OP_2 => "OP_2",
        OP_3 => "OP_3",
        OP_4 => "OP_4",
        OP_5 => "OP_5",
        OP_6 => "OP_6",
        OP_7 => "OP_7",
        OP_8 => "OP_8",
        OP_9 => "OP_9",
        OP_10 => "OP_10",
        OP_11 => "OP_11",
        OP_12 => "OP_12",
        OP_13 => "OP_13",
        OP_14 => "OP_14",
        OP_15 => "OP_15",
        OP_16 => "OP_16",
        OP_NOP => "OP_NOP",
        OP_VER => "OP_VER",
        OP_IF => "OP_IF",
        OP_NOTIF => "OP_NOTIF",
        OP_VERIF => "OP_VERIF",
        OP_VERNOTIF => "OP_VERNOTIF",
        OP_ELSE => "OP_ELSE",
        OP_ENDIF => "OP_ENDIF",
        OP_VERIFY => "OP_VERIFY",
        OP_RETURN => "OP_RETURN",
        OP_DROP => "OP_DROP",
        OP_DUP => "OP_DUP",
        OP_NIP => "OP_NIP",
        OP_OVER => "OP_OVER",
        OP_SWAP => "OP_SWAP",
        OP_EQUAL => "OP_EQUAL",
        OP_EQUALVERIFY => "OP_EQUALVERIFY",
        OP_RIPEMD160 => "OP_RIPEMD160",
        OP_SHA1 => "OP_SHA1",
        OP_SHA256 => "OP_SHA256",
        OP_HASH160 => "OP_HASH160",
        OP_HASH256 => "OP_HASH256",
        OP_CODESEPARATOR => "OP_CODESEPARATOR",
        OP_CHECKSIG => "OP_CHECKSIG",
        OP_CHECKSIGVERIFY => "OP_CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG",
        OP_CHECKMULTISIGVERIFY => "OP_CHECKMULTISIGVERIFY",
        OP_NOP1 => "OP_NOP1",
        OP_CHECKLOCKTIMEVERIFY => "OP_CHECKLOCKTIMEVERIFY",
        OP_CHECKSEQUENCEVERIFY => "OP_CHECKSEQUENCEVERIFY",
        OP_NOP4 => "OP_NOP4",
        OP_NOP5 => "OP_NOP5",
        OP_NOP6 => "OP_NOP6",
        OP_NOP7 => "OP_NOP7",
        OP_NOP8 => "OP_NOP8",
        OP_NOP9 => "OP_NOP9",
        OP_NOP10 => "OP_NOP10",
        _ => "OP_UNKNOWN",
    }
}

/// Map a canonical `OP_xxx` name to its opcode byte.
///
/// Used by ASM parsing; data pushes are handled separately.
///
/// # Arguments
/// * `name` - The opcode name, e.g. `"OP_DUP"`.
///
/// # Returns
/// `Some(opcode)` for known non-push opcodes, `None` otherwise.
pub fn string_to_opcode(name: &str) -> Option<u8> {
    let op = match name {
        "OP_0" | "OP_FALSE" => OP_0,
        "OP_1NEGATE" => OP_1NEGATE,
        "OP_RESERVED" => OP_RESERVED,
        "OP_1" | "OP_TRUE" => OP_1,
        "OP_2" => OP_2,
        "OP_3" => OP_3,
        "OP_4" => OP_4,
        "OP_5" => OP_5,
        "OP_6" => OP_6,
        "OP_7" => OP_7,
        "OP_8" => OP_8,
        "OP_9" => OP_9,
        "OP_10" => OP_10,
        "OP_11" => OP_11,
        "OP_12" => OP_12,
        "OP_13" => OP_13,
        "OP_14" => OP_14,
        "OP_15" => OP_15,
        "OP_16" => OP_16,
        "OP_NOP" => OP_NOP,
        "OP_VER" => OP_VER,
        "OP_IF" => OP_IF,
        "OP_NOTIF" => OP_NOTIF,
        "OP_VERIF" => OP_VERIF,
        "OP_VERNOTIF" => OP_VERNOTIF,
        "OP_ELSE" => OP_ELSE,
        "OP_ENDIF" => OP_ENDIF,
        "OP_VERIFY" => OP_VERIFY,
        "OP_RETURN" => OP_RETURN,
        "OP_DROP" => OP_DROP,
        "OP_DUP" => OP_DUP,
        "OP_NIP" => OP_NIP,
        "OP_OVER" => OP_OVER,
        "OP_SWAP" => OP_SWAP,
        "OP_EQUAL" => OP_EQUAL,
        "OP_EQUALVERIFY" => OP_EQUALVERIFY,
        "OP_RIPEMD160" => OP_RIPEMD160,
        "OP_SHA1" => OP_SHA1,
        "OP_SHA256" => OP_SHA256,
        "OP_HASH160" => OP_HASH160,
        "OP_HASH256" => OP_HASH256,
        "OP_CODESEPARATOR" => OP_CODESEPARATOR,
        "OP_CHECKSIG" => OP_CHECKSIG,
        "OP_CHECKSIGVERIFY" => OP_CHECKSIGVERIFY,
        "OP_CHECKMULTISIG" => OP_CHECKMULTISIG,
        "OP_CHECKMULTISIGVERIFY" => OP_CHECKMULTISIGVERIFY,
        "OP_NOP1" => OP_NOP1,
        "OP_CHECKLOCKTIMEVERIFY" => OP_CHECKLOCKTIMEVERIFY,
        "OP_CHECKSEQUENCEVERIFY" => OP_CHECKSEQUENCEVERIFY,
        "OP_NOP4" => OP_NOP4,
        "OP_NOP5" => OP_NOP5,
        "OP_NOP6" => OP_NOP6,
        "OP_NOP7" => OP_NOP7,
        "OP_NOP8" => OP_NOP8,
        "OP_NOP9" => OP_NOP9,
        "OP_NOP10" => OP_NOP10,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify small-int helpers agree with each other.
    #[test]
    fn test_small_int_helpers() {
        assert!(is_small_int_op(OP_0));
        assert!(is_small_int_op(OP_1));
        assert!(is_small_int_op(OP_16));
        assert!(!is_small_int_op(OP_1NEGATE));
        assert!(!is_small_int_op(OP_DUP));

        for n in 1..=16u8 {
            let op = encode_op_n(n);
            assert!(is_small_int_op(op));
            assert_eq!(decode_op_n(op), n);
        }
        assert_eq!(encode_op_n(0), OP_0);
        assert_eq!(decode_op_n(OP_0), 0);
    }

    /// Verify name round-trips for a representative opcode sample.
    #[test]
    fn test_opcode_name_roundtrip() {
        for op in [
            OP_DUP,
            OP_HASH160,
            OP_EQUALVERIFY,
            OP_CHECKSIG,
            OP_CHECKMULTISIG,
            OP_RETURN,
            OP_1,
            OP_16,
        ] {
            let name = opcode_to_string(op);
            assert_eq!(string_to_opcode(name), Some(op), "roundtrip for {}", name);
        }
    }

    /// Verify unknown names and bytes are handled.
    #[test]
    fn test_unknown_opcodes() {
        assert_eq!(string_to_opcode("OP_BOGUS"), None);
        assert_eq!(opcode_to_string(0xff), "OP_UNKNOWN");
    }
}
