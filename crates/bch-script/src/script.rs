/// Bitcoin Cash Script type - a sequence of opcodes and data pushes.
///
/// Scripts are used in transaction inputs (unlocking) and outputs (locking)
/// to define spending conditions. The Script wraps a `Vec<u8>` and provides
/// methods for construction, classification, serialization, and ASM output.

use std::fmt;

use bch_primitives::hash::hash160;

use crate::chunk::{decode_script, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// Length of a script identifier in bytes.
pub const SCRIPT_ID_LEN: usize = 20;

/// The Hash160 of a serialized script.
///
/// Used to reference embedded scripts in P2SH outputs and to index
/// scripts in signing providers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptId([u8; SCRIPT_ID_LEN]);

impl ScriptId {
    /// Compute the identifier of serialized script bytes.
    ///
    /// # Arguments
    /// * `script_bytes` - The raw script bytes.
    ///
    /// # Returns
    /// The 20-byte identifier.
    pub fn of(script_bytes: &[u8]) -> Self {
        ScriptId(hash160(script_bytes))
    }

    /// Create a script identifier from a 20-byte slice.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 20 bytes.
    ///
    /// # Returns
    /// `Ok(ScriptId)` on success, or an error if the length is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        if bytes.len() != SCRIPT_ID_LEN {
            return Err(ScriptError::InvalidScript(format!(
                "script id must be {} bytes, got {}",
                SCRIPT_ID_LEN,
                bytes.len()
            )));
        }
        let mut out = [0u8; SCRIPT_ID_LEN];
        out.copy_from_slice(bytes);
        Ok(ScriptId(out))
    }

    /// Return the raw 20 hash bytes.
    ///
    /// # Returns
    /// A byte slice of length 20.
    pub fn as_bytes(&self) -> &[u8; SCRIPT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptId({})", hex::encode(self.0))
    }
}

/// A Bitcoin Cash script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    ///
    /// # Returns
    /// An empty `Script` instance.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Create a script from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - Raw script bytes.
    ///
    /// # Returns
    /// A `Script` wrapping a copy of the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from a Bitcoin ASM string.
    ///
    /// Parses space-separated tokens where known opcodes (e.g. "OP_DUP") are
    /// emitted directly and hex strings are treated as push data.
    ///
    /// # Arguments
    /// * `asm` - A space-separated ASM string.
    ///
    /// # Returns
    /// A `Script`, or an error if any token is invalid.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        if asm.is_empty() {
            return Ok(script);
        }
        for section in asm.split(' ') {
            if let Some(opcode) = string_to_opcode(section) {
                script.append_opcodes(&[opcode])?;
            } else {
                script.append_push_data_hex(section)?;
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the script as a hex string.
    ///
    /// # Returns
    /// A lowercase hex representation of the script bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Convert the script to its ASM (human-readable assembly) representation.
    ///
    /// Each opcode or data push is represented as a space-separated token.
    ///
    /// # Returns
    /// A space-separated ASM string. Returns empty string for empty/invalid
    /// scripts.
    pub fn to_asm(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let chunks = match self.chunks() {
            Ok(c) => c,
            Err(_) => return String::new(),
        };
        let parts: Vec<String> = chunks
            .iter()
            .map(ScriptChunk::to_asm_string)
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }

    /// Return a reference to the underlying bytes.
    ///
    /// # Returns
    /// A byte slice of the script contents.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the length of the script in bytes.
    ///
    /// # Returns
    /// The number of bytes in the script.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the script is empty (zero bytes).
    ///
    /// # Returns
    /// `true` if the script has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compute this script's 160-bit identifier.
    ///
    /// # Returns
    /// The `ScriptId` (Hash160 of the serialized script).
    pub fn script_id(&self) -> ScriptId {
        ScriptId::of(&self.0)
    }

    // -----------------------------------------------------------------------
    // Script classification
    // -----------------------------------------------------------------------

    /// Check if this is a Pay-to-Public-Key-Hash (P2PKH) output script.
    ///
    /// Pattern: OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    ///
    /// # Returns
    /// `true` if the script matches the P2PKH pattern.
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// Check if this is a Pay-to-Public-Key (P2PK) output script.
    ///
    /// Pattern: <pubkey> OP_CHECKSIG (pubkey is 33 or 65 bytes with valid
    /// prefix).
    ///
    /// # Returns
    /// `true` if the script matches the P2PK pattern.
    pub fn is_p2pk(&self) -> bool {
        let parts = match self.chunks() {
            Ok(p) => p,
            Err(_) => return false,
        };
        if parts.len() == 2 && parts[1].op == OP_CHECKSIG {
            if let Some(ref pubkey) = parts[0].data {
                return is_pubkey_bytes(pubkey);
            }
        }
        false
    }

    /// Check if this is a Pay-to-Script-Hash (P2SH) output script.
    ///
    /// Pattern: OP_HASH160 <20 bytes> OP_EQUAL
    ///
    /// # Returns
    /// `true` if the script matches the P2SH pattern.
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// Check if this is a data-carrier output script.
    ///
    /// Pattern: OP_RETURN followed only by data pushes.
    ///
    /// # Returns
    /// `true` if the script is an OP_RETURN data output.
    pub fn is_null_data(&self) -> bool {
        let b = &self.0;
        !b.is_empty() && b[0] == OP_RETURN && is_push_only_bytes(&b[1..])
    }

    /// Check if this is a bare multisig output script.
    ///
    /// Pattern: OP_m <pubkey1> ... <pubkeyn> OP_n OP_CHECKMULTISIG
    ///
    /// # Returns
    /// `true` if the script matches the multisig output pattern.
    pub fn is_multisig(&self) -> bool {
        let parts = match self.chunks() {
            Ok(p) => p,
            Err(_) => return false,
        };
        if parts.len() < 4 {
            return false;
        }
        if !is_small_int_op(parts[0].op) || parts[0].op == OP_0 {
            return false;
        }
        for chunk in &parts[1..parts.len() - 2] {
            match &chunk.data {
                Some(d) if is_pubkey_bytes(d) => {}
                _ => return false,
            }
        }
        let second_last = &parts[parts.len() - 2];
        let last = &parts[parts.len() - 1];
        is_small_int_op(second_last.op)
            && second_last.op != OP_0
            && last.op == OP_CHECKMULTISIG
    }

    /// Check whether the script consists only of push operations.
    ///
    /// Every opcode at or below OP_16 counts as a push.
    ///
    /// # Returns
    /// `true` if no non-push opcode appears.
    pub fn is_push_only(&self) -> bool {
        is_push_only_bytes(&self.0)
    }

    /// Parse the script into a vector of decoded chunks.
    ///
    /// # Returns
    /// A vector of `ScriptChunk` values, or an error if the script is
    /// malformed.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    // -----------------------------------------------------------------------
    // Mutation / building
    // -----------------------------------------------------------------------

    /// Append data bytes to the script with the proper PUSHDATA prefix.
    ///
    /// Chooses the minimal encoding: direct push for 1-75 bytes,
    /// OP_PUSHDATA1 for 76-255, OP_PUSHDATA2 for 256-65535, etc.
    ///
    /// # Arguments
    /// * `data` - The data bytes to push.
    ///
    /// # Returns
    /// `Ok(())` on success, or an error if the data is too large.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append hex-encoded data to the script with proper PUSHDATA prefix.
    ///
    /// # Arguments
    /// * `hex_str` - Hex string to decode and push.
    ///
    /// # Returns
    /// `Ok(())` on success, or an error if the hex is invalid or data too
    /// large.
    pub fn append_push_data_hex(&mut self, hex_str: &str) -> Result<(), ScriptError> {
        let data = hex::decode(hex_str).map_err(|_| ScriptError::InvalidOpcodeData)?;
        self.append_push_data(&data)
    }

    /// Append raw opcodes to the script.
    ///
    /// Rejects push data opcodes (OP_DATA_1..OP_PUSHDATA4) to prevent misuse.
    /// Use `append_push_data` for those.
    ///
    /// # Arguments
    /// * `opcodes` - Slice of opcode bytes to append.
    ///
    /// # Returns
    /// `Ok(())` on success, or an error if a push data opcode is encountered.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        for &op in opcodes {
            if op >= OP_DATA_1 && op <= OP_PUSHDATA4 {
                return Err(ScriptError::InvalidOpcodeType(
                    opcode_to_string(op).to_string(),
                ));
            }
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Check if this script is byte-equal to another script.
    ///
    /// # Arguments
    /// * `other` - The other script to compare with.
    ///
    /// # Returns
    /// `true` if both scripts have identical bytes.
    pub fn equals(&self, other: &Script) -> bool {
        self.0 == other.0
    }
}

/// Check whether raw script bytes consist only of push operations.
///
/// Mirrors the consensus rule: every opcode greater than OP_16 makes the
/// script non-push-only; truncated pushes also fail.
fn is_push_only_bytes(bytes: &[u8]) -> bool {
    let mut pos = 0;
    while pos < bytes.len() {
        let op = bytes[pos];
        if op > OP_16 {
            return false;
        }
        match op {
            OP_PUSHDATA1 => {
                if bytes.len() < pos + 2 {
                    return false;
                }
                let length = bytes[pos + 1] as usize;
                pos += 2 + length;
            }
            OP_PUSHDATA2 => {
                if bytes.len() < pos + 3 {
                    return false;
                }
                let length = u16::from_le_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize;
                pos += 3 + length;
            }
            OP_PUSHDATA4 => {
                if bytes.len() < pos + 5 {
                    return false;
                }
                let length = u32::from_le_bytes([
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                    bytes[pos + 4],
                ]) as usize;
                pos += 5 + length;
            }
            _ if op >= OP_DATA_1 && op < OP_PUSHDATA1 => {
                pos += 1 + op as usize;
            }
            _ => {
                pos += 1;
            }
        }
        if pos > bytes.len() {
            return false;
        }
    }
    true
}

/// Check whether bytes look like a serialized public key.
///
/// Compressed keys are 33 bytes with prefix 0x02/0x03; uncompressed keys
/// are 65 bytes with prefix 0x04/0x06/0x07.
pub(crate) fn is_pubkey_bytes(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    match bytes[0] {
        0x02 | 0x03 => bytes.len() == 33,
        0x04 | 0x06 | 0x07 => bytes.len() == 65,
        _ => false,
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
