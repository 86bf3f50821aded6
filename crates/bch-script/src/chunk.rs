//! Script chunk parsing and encoding.
//!
//! A script chunk is either an opcode or a data push with its associated
//! bytes. This module handles decoding raw script bytes into structured
//! chunks and encoding push data with the correct OP_PUSHDATA prefix.

use crate::opcodes::*;
use crate::ScriptError;

/// Maximum size of a single pushed element (consensus rule).
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// A single parsed element of a Bitcoin script.
///
/// Each chunk is either a standalone opcode (like OP_DUP) or a data push
/// that carries the opcode byte and the pushed data bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub op: u8,
    /// The data payload, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Convert this chunk to its ASM string representation.
    ///
    /// Data push chunks are rendered as hex strings; non-push opcodes use
    /// their canonical OP_xxx name.
    ///
    /// # Returns
    /// A string suitable for inclusion in a space-separated ASM output.
    pub fn to_asm_string(&self) -> String {
        if self.op > OP_0 && self.op <= OP_PUSHDATA4 {
            if let Some(ref data) = self.data {
                return hex::encode(data);
            }
        }
        opcode_to_string(self.op).to_string()
    }
}

/// Decode raw script bytes into a vector of `ScriptChunk` values.
///
/// Handles OP_DATA_1..OP_DATA_75 (direct push), OP_PUSHDATA1/2/4
/// (extended push), and OP_RETURN (consumes remaining bytes as data).
///
/// # Arguments
/// * `bytes` - The raw script bytes to decode.
///
/// # Returns
/// A vector of parsed chunks, or a `ScriptError` if the data is truncated.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];

        match op {
            OP_RETURN => {
                // Consume the rest of the script as data attached to OP_RETURN.
                let data = bytes[pos..].to_vec();
                chunks.push(ScriptChunk { op, data: Some(data) });
                pos = bytes.len();
            }
            OP_PUSHDATA1 => {
                if bytes.len() < pos + 2 {
                    return Err(ScriptError::DataTooSmall);
                }
                let length = bytes[pos + 1] as usize;
                pos += 2;
                if bytes.len() < pos + length {
                    return Err(ScriptError::DataTooSmall);
                }
                chunks.push(ScriptChunk {
                    op,
                    data: Some(bytes[pos..pos + length].to_vec()),
                });
                pos += length;
            }
            OP_PUSHDATA2 => {
                if bytes.len() < pos + 3 {
                    return Err(ScriptError::DataTooSmall);
                }
                let length = u16::from_le_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize;
                pos += 3;
                if bytes.len() < pos + length {
                    return Err(ScriptError::DataTooSmall);
                }
                chunks.push(ScriptChunk {
                    op,
                    data: Some(bytes[pos..pos + length].to_vec()),
                });
                pos += length;
            }
            OP_PUSHDATA4 => {
                if bytes.len() < pos + 5 {
                    return Err(ScriptError::DataTooSmall);
                }
                let length = u32::from_le_bytes([
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                    bytes[pos + 4],
                ]) as usize;
                pos += 5;
                if bytes.len() < pos + length {
                    return Err(ScriptError::DataTooSmall);
                }
                chunks.push(ScriptChunk {
                    op,
                    data: Some(bytes[pos..pos + length].to_vec()),
                });
                pos += length;
            }
            _ if op >= OP_DATA_1 && op < OP_PUSHDATA1 => {
                let length = op as usize;
                if bytes.len() < pos + 1 + length {
                    return Err(ScriptError::DataTooSmall);
                }
                chunks.push(ScriptChunk {
                    op,
                    data: Some(bytes[pos + 1..pos + 1 + length].to_vec()),
                });
                pos += 1 + length;
            }
            _ => {
                chunks.push(ScriptChunk { op, data: None });
                pos += 1;
            }
        }
    }

    Ok(chunks)
}

/// Compute the push-prefix bytes for data of the given length.
///
/// Chooses the minimal encoding: direct length byte for 1-75 bytes,
/// OP_PUSHDATA1 for up to 255, OP_PUSHDATA2 for up to 65535, and
/// OP_PUSHDATA4 beyond that.
///
/// # Arguments
/// * `length` - The length of the data to push.
///
/// # Returns
/// The prefix bytes, or an error if the data is too large to push.
pub fn push_data_prefix(length: usize) -> Result<Vec<u8>, ScriptError> {
    if length <= OP_DATA_75 as usize {
        Ok(vec![length as u8])
    } else if length <= 0xff {
        Ok(vec![OP_PUSHDATA1, length as u8])
    } else if length <= 0xffff {
        let mut prefix = vec![OP_PUSHDATA2];
        prefix.extend_from_slice(&(length as u16).to_le_bytes());
        Ok(prefix)
    } else if length <= 0xffff_ffff {
        let mut prefix = vec![OP_PUSHDATA4];
        prefix.extend_from_slice(&(length as u32).to_le_bytes());
        Ok(prefix)
    } else {
        Err(ScriptError::DataTooBig)
    }
}
