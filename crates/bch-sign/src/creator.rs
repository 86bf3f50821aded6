//! Signature creators and their matching checkers.
//!
//! A signature creator produces one signature for a key identifier and a
//! script code, and exposes the checker that can validate what it produced.
//! Two variants exist: the real transaction-bound creator, and a dummy
//! creator whose fixed-size output upper-bounds real scriptSigs for fee
//! estimation.

use bch_primitives::ec::{KeyId, PublicKey, Signature};
use bch_script::interpreter::{ScriptFlags, SignatureChecker};
use bch_script::Script;
use bch_transaction::sighash::{signature_hash, SIGHASH_ALL, SIGHASH_FORKID};
use bch_transaction::Transaction;

use crate::provider::SigningProvider;

/// Byte length of a dummy signature: a maximally-sized DER skeleton plus
/// the sighash-type byte.
pub const DUMMY_SIGNATURE_LEN: usize = 72;

/// Produces one signature per request, bound to some signing context.
pub trait SignatureCreator {
    /// Create a signature for the given key over the given script code.
    ///
    /// The returned bytes are stack-ready: DER-encoded ECDSA followed by
    /// the one-byte sighash type.
    ///
    /// # Arguments
    /// * `provider` - Lookup for the private key.
    /// * `key_id` - The key to sign with.
    /// * `script_code` - The script the signature commits to.
    ///
    /// # Returns
    /// The signature bytes, or `None` if the key is absent or signing
    /// failed.
    fn create_sig(
        &self,
        provider: &dyn SigningProvider,
        key_id: &KeyId,
        script_code: &Script,
    ) -> Option<Vec<u8>>;

    /// The checker matching this creator's signatures.
    ///
    /// # Returns
    /// A checker bound to the same context.
    fn checker(&self) -> &dyn SignatureChecker;
}

// -----------------------------------------------------------------------
// Transaction-bound creator and checker
// -----------------------------------------------------------------------

/// Signature checker bound to a transaction, input index, and amount.
///
/// Splits the trailing sighash-type byte off the signature, recomputes the
/// BIP143+FORKID digest, and verifies the ECDSA signature against it.
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
    input_index: usize,
    satoshis: u64,
}

impl<'a> TransactionSignatureChecker<'a> {
    /// Create a checker for one input of a transaction.
    ///
    /// # Arguments
    /// * `tx` - The transaction being verified.
    /// * `input_index` - The input whose signatures are checked.
    /// * `satoshis` - The value of the output being spent.
    ///
    /// # Returns
    /// The bound checker.
    pub fn new(tx: &'a Transaction, input_index: usize, satoshis: u64) -> Self {
        TransactionSignatureChecker { tx, input_index, satoshis }
    }
}

impl SignatureChecker for TransactionSignatureChecker<'_> {
    fn check_sig(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        script_code: &Script,
        flags: ScriptFlags,
    ) -> bool {
        if full_sig.is_empty() {
            return false;
        }
        let sighash_type = *full_sig.last().unwrap() as u32;

        // Replay protection is not optional on this chain.
        if flags.has_flag(ScriptFlags::ENABLE_SIGHASH_FORKID)
            && sighash_type & SIGHASH_FORKID == 0
        {
            return false;
        }

        let pubkey = match PublicKey::from_bytes(pub_key) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let sig = match Signature::from_der(&full_sig[..full_sig.len() - 1]) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        let digest = match signature_hash(
            self.tx,
            self.input_index,
            script_code.to_bytes(),
            sighash_type,
            self.satoshis,
        ) {
            Ok(digest) => digest,
            Err(_) => return false,
        };

        pubkey.verify(&digest, &sig)
    }
}

/// Signature creator bound to a transaction, input index, amount, and
/// sighash type.
pub struct TransactionSignatureCreator<'a> {
    tx: &'a Transaction,
    input_index: usize,
    satoshis: u64,
    sighash_type: u32,
    checker: TransactionSignatureChecker<'a>,
}

impl<'a> TransactionSignatureCreator<'a> {
    /// Create a signature creator for one input of a transaction.
    ///
    /// # Arguments
    /// * `tx` - The transaction being signed.
    /// * `input_index` - The input to sign.
    /// * `satoshis` - The value of the output being spent.
    /// * `sighash_type` - The sighash flags to commit to (must include the
    ///   FORKID bit for signatures to verify on this chain).
    ///
    /// # Returns
    /// The bound creator.
    pub fn new(
        tx: &'a Transaction,
        input_index: usize,
        satoshis: u64,
        sighash_type: u32,
    ) -> Self {
        TransactionSignatureCreator {
            tx,
            input_index,
            satoshis,
            sighash_type,
            checker: TransactionSignatureChecker::new(tx, input_index, satoshis),
        }
    }
}

impl SignatureCreator for TransactionSignatureCreator<'_> {
    fn create_sig(
        &self,
        provider: &dyn SigningProvider,
        key_id: &KeyId,
        script_code: &Script,
    ) -> Option<Vec<u8>> {
        let key = provider.get_key(key_id)?;

        let digest = signature_hash(
            self.tx,
            self.input_index,
            script_code.to_bytes(),
            self.sighash_type,
            self.satoshis,
        )
        .ok()?;
        let signature = key.sign(&digest).ok()?;

        let mut sig = signature.to_der();
        sig.push(self.sighash_type as u8);
        Some(sig)
    }

    fn checker(&self) -> &dyn SignatureChecker {
        &self.checker
    }
}

// -----------------------------------------------------------------------
// Dummy creator and checker (fee estimation)
// -----------------------------------------------------------------------

/// A checker that accepts every signature.
pub struct DummySignatureChecker;

impl SignatureChecker for DummySignatureChecker {
    fn check_sig(
        &self,
        _full_sig: &[u8],
        _pub_key: &[u8],
        _script_code: &Script,
        _flags: ScriptFlags,
    ) -> bool {
        true
    }
}

/// A creator producing fixed-size placeholder signatures.
///
/// The output is a maximally-sized valid DER skeleton, so scriptSigs
/// assembled from it upper-bound the length of real ones. Used to size
/// transactions for fee estimation without touching any keys.
pub struct DummySignatureCreator;

impl SignatureCreator for DummySignatureCreator {
    fn create_sig(
        &self,
        _provider: &dyn SigningProvider,
        _key_id: &KeyId,
        _script_code: &Script,
    ) -> Option<Vec<u8>> {
        // 0x30 <69> 0x02 <33> 0x01 0x00.. 0x02 <32> 0x01 0x00.. <sighash>
        let mut sig = vec![0u8; DUMMY_SIGNATURE_LEN];
        sig[0] = 0x30;
        sig[1] = 69;
        sig[2] = 0x02;
        sig[3] = 33;
        sig[4] = 0x01;
        sig[4 + 33] = 0x02;
        sig[5 + 33] = 32;
        sig[6 + 33] = 0x01;
        sig[6 + 33 + 32] = (SIGHASH_ALL | SIGHASH_FORKID) as u8;
        Some(sig)
    }

    fn checker(&self) -> &dyn SignatureChecker {
        &DummySignatureChecker
    }
}
