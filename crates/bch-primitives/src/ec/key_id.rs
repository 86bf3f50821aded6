//! 160-bit public key identifier.
//!
//! A `KeyId` is the Hash160 (RIPEMD-160 of SHA-256) of a serialized public
//! key. It is the primary index for signatures and public keys in signing
//! data, and the payload of P2PKH locking scripts.

use std::fmt;

use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a key identifier in bytes.
pub const KEY_ID_LEN: usize = 20;

/// The Hash160 of a serialized public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId([u8; KEY_ID_LEN]);

impl KeyId {
    /// Compute the key identifier of a serialized public key.
    ///
    /// The hash covers the bytes exactly as given, so a compressed and an
    /// uncompressed serialization of the same key have different ids.
    ///
    /// # Arguments
    /// * `pubkey_bytes` - SEC1-serialized public key bytes.
    ///
    /// # Returns
    /// The 20-byte identifier.
    pub fn of(pubkey_bytes: &[u8]) -> Self {
        KeyId(hash160(pubkey_bytes))
    }

    /// Create a key identifier from a 20-byte slice.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 20 bytes.
    ///
    /// # Returns
    /// `Ok(KeyId)` on success, or an error if the length is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != KEY_ID_LEN {
            return Err(PrimitivesError::InvalidLength {
                expected: KEY_ID_LEN,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; KEY_ID_LEN];
        out.copy_from_slice(bytes);
        Ok(KeyId(out))
    }

    /// Return the raw 20 hash bytes.
    ///
    /// # Returns
    /// A byte slice of length 20.
    pub fn as_bytes(&self) -> &[u8; KEY_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify that KeyId::of matches a direct hash160 computation.
    #[test]
    fn test_key_id_of_matches_hash160() {
        let pubkey =
            hex::decode("02f0d97c290e79bf2a8660c406aa56b6f189ff79f2245cc5aff82808b58131b4d5")
                .unwrap();
        let id = KeyId::of(&pubkey);
        assert_eq!(id.as_bytes(), &hash160(&pubkey));
    }

    /// Verify from_bytes rejects slices that are not exactly 20 bytes.
    #[test]
    fn test_key_id_from_bytes_length() {
        assert!(KeyId::from_bytes(&[0u8; 20]).is_ok());
        assert!(KeyId::from_bytes(&[0u8; 19]).is_err());
        assert!(KeyId::from_bytes(&[0u8; 21]).is_err());
    }

    /// Verify Display renders lowercase hex.
    #[test]
    fn test_key_id_display() {
        let id = KeyId::from_bytes(&[0xab; 20]).unwrap();
        assert_eq!(id.to_string(), "ab".repeat(20));
    }
}
