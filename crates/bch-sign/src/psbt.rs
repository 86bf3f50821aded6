//! In-memory partially signed transaction records.
//!
//! A [`Psbt`] carries an unsigned transaction skeleton plus one record per
//! input and output. Records accumulate partial signatures, BIP32 key
//! origins, and redeem scripts from multiple signers; merges are monotone,
//! so combining the same records in any order loses nothing. Once an input
//! has a `final_script_sig` it is finalized and immutable.
//!
//! Wire serialization of these records is out of scope here; this module
//! is the data model and its bridge to [`SignatureData`].

use std::collections::BTreeMap;

use bch_primitives::ec::{KeyId, PublicKey};
use bch_script::Script;
use bch_transaction::{Transaction, TransactionOutput};

use crate::creator::TransactionSignatureCreator;
use crate::provider::SigningProvider;
use crate::sign::{produce_signature, SigPair, SignatureData};

/// Error types for PSBT construction.
#[derive(Debug, thiserror::Error)]
pub enum PsbtError {
    /// The transaction skeleton already carries scriptSigs.
    #[error("unsigned transaction has non-empty scriptSigs")]
    UnsignedTxHasScriptSigs,
}

/// A BIP32 key origin: master key fingerprint plus derivation path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeySource {
    /// Fingerprint of the master key this path derives from.
    pub fingerprint: [u8; 4],
    /// Child indexes from the master key to the signing key.
    pub path: Vec<u32>,
}

// -----------------------------------------------------------------------
// PsbtInput
// -----------------------------------------------------------------------

/// Per-input record of a partially signed transaction.
#[derive(Clone, Debug, Default)]
pub struct PsbtInput {
    /// The output being spent, when known.
    pub utxo: Option<TransactionOutput>,
    /// Partial signatures, keyed by the signing pubkey's identifier.
    pub partial_sigs: BTreeMap<KeyId, SigPair>,
    /// BIP32 origins keyed by serialized public key.
    pub hd_keypaths: BTreeMap<Vec<u8>, KeySource>,
    /// The redeem script for script-hash outputs (empty if none).
    pub redeem_script: Script,
    /// The finalized scriptSig. Once non-empty the input is immutable.
    pub final_script_sig: Script,
    /// Unknown key-value pairs carried for forward compatibility.
    pub unknown: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl PsbtInput {
    /// Create an empty input record.
    ///
    /// # Returns
    /// A record with no UTXO, signatures, or scripts.
    pub fn new() -> Self {
        PsbtInput::default()
    }

    /// Check whether the record carries no information.
    ///
    /// # Returns
    /// `true` if every field is empty.
    pub fn is_null(&self) -> bool {
        self.utxo.is_none()
            && self.partial_sigs.is_empty()
            && self.unknown.is_empty()
            && self.hd_keypaths.is_empty()
            && self.redeem_script.is_empty()
    }

    /// Sanity check hook. No invariants are enforced at this layer.
    ///
    /// # Returns
    /// Always `true`.
    pub fn is_sane(&self) -> bool {
        true
    }

    /// Copy this record's knowledge into a signing attempt.
    ///
    /// A finalized input short-circuits: the final scriptSig is installed
    /// and the data marked complete. Otherwise partial signatures, the
    /// redeem script, and the keypath pubkeys flow over.
    ///
    /// # Arguments
    /// * `sigdata` - The signing state to fill.
    pub fn fill_signature_data(&self, sigdata: &mut SignatureData) {
        if !self.final_script_sig.is_empty() {
            sigdata.script_sig = self.final_script_sig.clone();
            sigdata.complete = true;
        }
        if sigdata.complete {
            return;
        }

        for (key_id, pair) in &self.partial_sigs {
            sigdata.signatures.entry(*key_id).or_insert_with(|| pair.clone());
        }
        if !self.redeem_script.is_empty() {
            sigdata.redeem_script = self.redeem_script.clone();
        }
        for pubkey_bytes in self.hd_keypaths.keys() {
            if let Ok(pubkey) = PublicKey::from_bytes(pubkey_bytes) {
                sigdata
                    .misc_pubkeys
                    .entry(KeyId::of(pubkey_bytes))
                    .or_insert(pubkey);
            }
        }
    }

    /// Absorb the outcome of a signing attempt.
    ///
    /// A complete attempt finalizes the input: partials, keypaths, and the
    /// redeem script are cleared and the scriptSig becomes final. A partial
    /// attempt union-inserts its signatures and contributes its redeem
    /// script if this record lacked one.
    ///
    /// # Arguments
    /// * `sigdata` - The signing state to absorb.
    pub fn from_signature_data(&mut self, sigdata: &SignatureData) {
        if sigdata.complete {
            self.partial_sigs.clear();
            self.hd_keypaths.clear();
            self.redeem_script = Script::new();

            if !sigdata.script_sig.is_empty() {
                self.final_script_sig = sigdata.script_sig.clone();
            }
            return;
        }

        for (key_id, pair) in &sigdata.signatures {
            self.partial_sigs.entry(*key_id).or_insert_with(|| pair.clone());
        }
        if self.redeem_script.is_empty() && !sigdata.redeem_script.is_empty() {
            self.redeem_script = sigdata.redeem_script.clone();
        }
    }

    /// Merge a peer record for the same input. Monotone: existing entries
    /// win, absent fields are adopted.
    ///
    /// # Arguments
    /// * `other` - The peer record.
    pub fn merge(&mut self, other: &PsbtInput) {
        if self.utxo.is_none() && other.utxo.is_some() {
            self.utxo = other.utxo.clone();
        }

        for (key_id, pair) in &other.partial_sigs {
            self.partial_sigs.entry(*key_id).or_insert_with(|| pair.clone());
        }
        for (pubkey, source) in &other.hd_keypaths {
            self.hd_keypaths
                .entry(pubkey.clone())
                .or_insert_with(|| source.clone());
        }
        for (key, value) in &other.unknown {
            self.unknown.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if self.redeem_script.is_empty() && !other.redeem_script.is_empty() {
            self.redeem_script = other.redeem_script.clone();
        }
        if self.final_script_sig.is_empty() && !other.final_script_sig.is_empty() {
            self.final_script_sig = other.final_script_sig.clone();
        }
    }
}

// -----------------------------------------------------------------------
// PsbtOutput
// -----------------------------------------------------------------------

/// Per-output record of a partially signed transaction.
#[derive(Clone, Debug, Default)]
pub struct PsbtOutput {
    /// The redeem script for script-hash outputs (empty if none).
    pub redeem_script: Script,
    /// BIP32 origins keyed by serialized public key.
    pub hd_keypaths: BTreeMap<Vec<u8>, KeySource>,
    /// Unknown key-value pairs carried for forward compatibility.
    pub unknown: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl PsbtOutput {
    /// Create an empty output record.
    ///
    /// # Returns
    /// A record with no scripts or keypaths.
    pub fn new() -> Self {
        PsbtOutput::default()
    }

    /// Check whether the record carries no information.
    ///
    /// # Returns
    /// `true` if every field is empty.
    pub fn is_null(&self) -> bool {
        self.redeem_script.is_empty() && self.hd_keypaths.is_empty() && self.unknown.is_empty()
    }

    /// Copy this record's scripts and pubkeys into a signing attempt.
    ///
    /// # Arguments
    /// * `sigdata` - The signing state to fill.
    pub fn fill_signature_data(&self, sigdata: &mut SignatureData) {
        if !self.redeem_script.is_empty() {
            sigdata.redeem_script = self.redeem_script.clone();
        }
        for pubkey_bytes in self.hd_keypaths.keys() {
            if let Ok(pubkey) = PublicKey::from_bytes(pubkey_bytes) {
                sigdata
                    .misc_pubkeys
                    .entry(KeyId::of(pubkey_bytes))
                    .or_insert(pubkey);
            }
        }
    }

    /// Adopt the redeem script from a signing attempt when missing.
    ///
    /// # Arguments
    /// * `sigdata` - The signing state to absorb.
    pub fn from_signature_data(&mut self, sigdata: &SignatureData) {
        if self.redeem_script.is_empty() && !sigdata.redeem_script.is_empty() {
            self.redeem_script = sigdata.redeem_script.clone();
        }
    }

    /// Merge a peer record for the same output.
    ///
    /// # Arguments
    /// * `other` - The peer record.
    pub fn merge(&mut self, other: &PsbtOutput) {
        for (pubkey, source) in &other.hd_keypaths {
            self.hd_keypaths
                .entry(pubkey.clone())
                .or_insert_with(|| source.clone());
        }
        for (key, value) in &other.unknown {
            self.unknown.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if self.redeem_script.is_empty() && !other.redeem_script.is_empty() {
            self.redeem_script = other.redeem_script.clone();
        }
    }
}

// -----------------------------------------------------------------------
// Psbt
// -----------------------------------------------------------------------

/// A partially signed transaction: an unsigned skeleton plus one record
/// per input and output.
#[derive(Clone, Debug, Default)]
pub struct Psbt {
    /// The unsigned transaction skeleton.
    pub tx: Option<Transaction>,
    /// One record per transaction input, index-aligned.
    pub inputs: Vec<PsbtInput>,
    /// One record per transaction output, index-aligned.
    pub outputs: Vec<PsbtOutput>,
    /// Unknown global key-value pairs.
    pub unknown: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Psbt {
    /// Create an empty (null) PSBT.
    ///
    /// # Returns
    /// A PSBT with no transaction or records.
    pub fn new() -> Self {
        Psbt::default()
    }

    /// Build a PSBT around an unsigned transaction skeleton.
    ///
    /// Creates one empty record per input and output.
    ///
    /// # Arguments
    /// * `tx` - The unsigned transaction; its inputs must not carry
    ///   scriptSigs.
    ///
    /// # Returns
    /// `Ok(Psbt)` or an error if the skeleton is already signed.
    pub fn from_unsigned_tx(tx: Transaction) -> Result<Self, PsbtError> {
        for input in &tx.inputs {
            if input.unlocking_script.is_some() {
                return Err(PsbtError::UnsignedTxHasScriptSigs);
            }
        }
        let inputs = vec![PsbtInput::new(); tx.inputs.len()];
        let outputs = vec![PsbtOutput::new(); tx.outputs.len()];
        Ok(Psbt {
            tx: Some(tx),
            inputs,
            outputs,
            unknown: BTreeMap::new(),
        })
    }

    /// Check whether the PSBT carries no information at all.
    ///
    /// # Returns
    /// `true` if the transaction, all records, and unknowns are empty.
    pub fn is_null(&self) -> bool {
        self.tx.is_none()
            && self.inputs.is_empty()
            && self.outputs.is_empty()
            && self.unknown.is_empty()
    }

    /// Merge a peer PSBT for the same underlying transaction.
    ///
    /// Records merge index by index. Peers must be aligned (equal input
    /// and output counts against the same unsigned transaction); handing
    /// in a differently-shaped peer is a caller bug.
    ///
    /// # Arguments
    /// * `other` - The peer PSBT.
    pub fn merge(&mut self, other: &Psbt) {
        debug_assert_eq!(self.inputs.len(), other.inputs.len());
        debug_assert_eq!(self.outputs.len(), other.outputs.len());

        for (input, other_input) in self.inputs.iter_mut().zip(&other.inputs) {
            input.merge(other_input);
        }
        for (output, other_output) in self.outputs.iter_mut().zip(&other.outputs) {
            output.merge(other_output);
        }
    }

    /// Sanity check across all input records.
    ///
    /// # Returns
    /// `true` if every input passes its sanity hook.
    pub fn is_sane(&self) -> bool {
        self.inputs.iter().all(PsbtInput::is_sane)
    }
}

/// Sign one PSBT input.
///
/// A finalized input returns `true` untouched. Otherwise the input's
/// knowledge flows into `sigdata`, a transaction-bound creator signs
/// against the UTXO's locking script, and the outcome flows back into the
/// input record (finalizing it on completion).
///
/// # Arguments
/// * `provider` - Key and script lookup.
/// * `tx` - The unsigned transaction the PSBT is built around.
/// * `input` - The input record to sign; updated in place.
/// * `sigdata` - Scratch signing state for this attempt.
/// * `index` - The input's index in the transaction.
/// * `sighash_type` - The sighash flags to commit to.
///
/// # Returns
/// `true` iff the input is fully signed (or already finalized).
pub fn sign_psbt_input(
    provider: &dyn SigningProvider,
    tx: &Transaction,
    input: &mut PsbtInput,
    sigdata: &mut SignatureData,
    index: usize,
    sighash_type: u32,
) -> bool {
    // A finalized input is immutable.
    if !input.final_script_sig.is_empty() {
        return true;
    }

    input.fill_signature_data(sigdata);

    let utxo = match &input.utxo {
        Some(utxo) => utxo.clone(),
        None => return false,
    };

    let creator = TransactionSignatureCreator::new(tx, index, utxo.satoshis, sighash_type);
    let sig_complete = produce_signature(provider, &creator, &utxo.locking_script, sigdata);
    input.from_signature_data(sigdata);
    sig_complete
}
