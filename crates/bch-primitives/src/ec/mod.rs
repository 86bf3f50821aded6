/// Elliptic curve cryptography on secp256k1.
///
/// Provides private keys, public keys, ECDSA signatures with DER
/// serialization, and 160-bit key identifiers.

pub mod key_id;
pub mod private_key;
pub mod public_key;
pub mod signature;

pub use key_id::KeyId;
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
