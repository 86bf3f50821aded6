//! Standard output template recognition.
//!
//! Classifies a locking script into one of the closed set of standard
//! template shapes and extracts its literal data pushes. The signing code
//! dispatches on the returned [`TemplateKind`]; everything it needs from
//! the script (key hashes, public keys, the multisig threshold) arrives in
//! the solutions vector.

use crate::opcodes::*;
use crate::script::is_pubkey_bytes;
use crate::Script;

/// The closed set of standard locking-script templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Not a recognized standard template (also the failure result).
    Nonstandard,
    /// OP_RETURN data carrier; provably unspendable.
    NullData,
    /// `<pubkey> OP_CHECKSIG`
    PubKey,
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash,
    /// `OP_HASH160 <20> OP_EQUAL`
    ScriptHash,
    /// `<m> <pk1>..<pkn> <n> OP_CHECKMULTISIG`
    Multisig,
}

/// Recognize a locking script's template and extract its data pushes.
///
/// Solutions per template:
/// - `PubKey`: `[pubkey]`
/// - `PubKeyHash`: `[key_hash]` (20 bytes)
/// - `ScriptHash`: `[script_hash]` (20 bytes)
/// - `Multisig`: `[[m], pk1, .., pkn, [n]]`
/// - `NullData`, `Nonstandard`: empty
///
/// An unrecognized or malformed script yields `Nonstandard`.
///
/// # Arguments
/// * `script` - The locking script to classify.
///
/// # Returns
/// The template kind and its extracted pushes.
pub fn solve(script: &Script) -> (TemplateKind, Vec<Vec<u8>>) {
    let bytes = script.to_bytes();

    // Shortcut the fixed-shape templates on raw bytes.
    if script.is_p2sh() {
        return (TemplateKind::ScriptHash, vec![bytes[2..22].to_vec()]);
    }
    if script.is_null_data() {
        return (TemplateKind::NullData, Vec::new());
    }
    if script.is_p2pkh() {
        return (TemplateKind::PubKeyHash, vec![bytes[3..23].to_vec()]);
    }

    let chunks = match script.chunks() {
        Ok(c) => c,
        Err(_) => return (TemplateKind::Nonstandard, Vec::new()),
    };

    // <pubkey> OP_CHECKSIG
    if chunks.len() == 2 && chunks[1].op == OP_CHECKSIG {
        if let Some(ref pubkey) = chunks[0].data {
            if is_pubkey_bytes(pubkey) {
                return (TemplateKind::PubKey, vec![pubkey.clone()]);
            }
        }
    }

    // <m> <pk1>..<pkn> <n> OP_CHECKMULTISIG
    if let Some(solutions) = match_multisig(&chunks) {
        return (TemplateKind::Multisig, solutions);
    }

    (TemplateKind::Nonstandard, Vec::new())
}

/// Match the bare multisig template and extract `[[m], pk1.., [n]]`.
///
/// Requires `1 <= m <= n`, `n` equal to the number of pubkey pushes, and
/// every push to look like a serialized public key.
fn match_multisig(chunks: &[crate::chunk::ScriptChunk]) -> Option<Vec<Vec<u8>>> {
    if chunks.len() < 4 {
        return None;
    }
    let first = &chunks[0];
    let second_last = &chunks[chunks.len() - 2];
    let last = &chunks[chunks.len() - 1];

    if last.op != OP_CHECKMULTISIG {
        return None;
    }
    if !is_small_int_op(first.op) || !is_small_int_op(second_last.op) {
        return None;
    }

    let required = decode_op_n(first.op);
    let key_count = decode_op_n(second_last.op);
    let keys = &chunks[1..chunks.len() - 2];

    if required < 1 || key_count < 1 || required > key_count {
        return None;
    }
    if keys.len() != key_count as usize {
        return None;
    }

    let mut solutions = Vec::with_capacity(keys.len() + 2);
    solutions.push(vec![required]);
    for chunk in keys {
        match &chunk.data {
            Some(d) if is_pubkey_bytes(d) => solutions.push(d.clone()),
            _ => return None,
        }
    }
    solutions.push(vec![key_count]);
    Some(solutions)
}
