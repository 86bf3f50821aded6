/// BCH SDK - Script-directed transaction signing.
///
/// Produces the unlocking scripts (scriptSigs) that satisfy standard
/// output templates, extracts partial signature data back out of existing
/// scriptSigs, and carries partially signed transactions between signers:
/// - Signing providers: read-only lookup of keys and embedded scripts
/// - Signature creators: real transaction-bound signing and dummy signing
///   for fee estimation
/// - The template-dispatching signer and its two-pass P2SH driver
/// - The reverse extractor that recovers signature data from a scriptSig
/// - In-memory PSBT records with monotone merge

pub mod creator;
pub mod provider;
pub mod psbt;
pub mod sign;

pub use creator::{
    DummySignatureChecker, DummySignatureCreator, SignatureCreator, TransactionSignatureChecker,
    TransactionSignatureCreator, DUMMY_SIGNATURE_LEN,
};
pub use provider::{MemorySigningProvider, SigningProvider};
pub use psbt::{sign_psbt_input, KeySource, Psbt, PsbtError, PsbtInput, PsbtOutput};
pub use sign::{
    data_from_transaction, produce_signature, sign_input, update_input, SigPair, SignatureData,
};
