//! Transaction output with satoshi value and locking script.
//!
//! Defines the spending conditions for the output's value. Provides binary
//! serialization/deserialization following the Bitcoin wire format.

use bch_primitives::util::{ByteReader, ByteWriter, VarInt};
use bch_script::Script;

use crate::TransactionError;

/// A single output in a BCH transaction.
///
/// Each output specifies a satoshi `satoshis` value and a `locking_script`
/// (scriptPubKey) that defines the conditions under which the funds may be
/// spent.
///
/// # Wire format
///
/// | Field            | Size           |
/// |------------------|----------------|
/// | satoshis         | 8 bytes (LE)   |
/// | script length    | VarInt         |
/// | locking_script   | variable       |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutput {
    /// The number of satoshis locked by this output.
    pub satoshis: u64,

    /// The locking script (scriptPubKey) that defines spending conditions.
    pub locking_script: Script,
}

impl TransactionOutput {
    /// Create a new `TransactionOutput` with zero satoshis and an empty
    /// script.
    ///
    /// # Returns
    /// A default `TransactionOutput`.
    pub fn new() -> Self {
        TransactionOutput {
            satoshis: 0,
            locking_script: Script::new(),
        }
    }

    /// Create an output locking the given amount with the given script.
    ///
    /// # Arguments
    /// * `satoshis` - The amount to lock.
    /// * `locking_script` - The locking script.
    ///
    /// # Returns
    /// The constructed `TransactionOutput`.
    pub fn locking(satoshis: u64, locking_script: Script) -> Self {
        TransactionOutput { satoshis, locking_script }
    }

    /// Deserialize a `TransactionOutput` from a `ByteReader`.
    ///
    /// Reads 8-byte LE satoshis, a varint script length, and the script
    /// bytes.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded output.
    ///
    /// # Returns
    /// `Ok(TransactionOutput)` on success, or a `TransactionError` if the
    /// data is truncated or malformed.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let satoshis = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading satoshis: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;

        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading locking script: {}", e))
        })?;

        Ok(TransactionOutput {
            satoshis,
            locking_script: Script::from_bytes(script_bytes),
        })
    }

    /// Serialize this `TransactionOutput` into a `ByteWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.satoshis);
        let script_bytes = self.locking_script.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(script_bytes);
    }

    /// Serialize this output to a byte vector.
    ///
    /// # Returns
    /// A `Vec<u8>` containing the wire-format bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}

impl Default for TransactionOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify an output round-trips through the wire format.
    #[test]
    fn test_output_wire_roundtrip() {
        let script = Script::from_hex("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac")
            .expect("valid hex");
        let output = TransactionOutput::locking(50_000, script.clone());

        let bytes = output.to_bytes();
        let mut reader = ByteReader::new(&bytes);
        let parsed = TransactionOutput::read_from(&mut reader).unwrap();

        assert_eq!(parsed.satoshis, 50_000);
        assert_eq!(parsed.locking_script, script);
        assert_eq!(reader.remaining(), 0);
    }

    /// Verify truncated data is rejected.
    #[test]
    fn test_output_truncated() {
        let mut reader = ByteReader::new(&[0u8; 4]);
        assert!(TransactionOutput::read_from(&mut reader).is_err());
    }
}
