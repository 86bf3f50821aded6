/// BCH SDK - Cryptographic primitives, hashing, and utilities.
///
/// This crate provides the foundational building blocks for the BCH SDK:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Elliptic curve cryptography (secp256k1 keys, ECDSA signatures)
/// - Key identifiers (160-bit hashes of serialized public keys)
/// - Variable-length integer encoding and binary reader/writer helpers

pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
