//! Script-directed signing and signature extraction.
//!
//! [`produce_signature`] recognizes a locking script's standard template,
//! gathers the stack items that satisfy it (recursing once for P2SH),
//! assembles the scriptSig, and verifies the result with the same engine a
//! consensus node runs. [`data_from_transaction`] walks the reverse
//! direction, recovering signatures, public keys, and the redeem script
//! from an existing, possibly partial, scriptSig.
//!
//! Recoverable misses (absent keys, unknown scripts) never error: they
//! surface as `complete = false` on a [`SignatureData`] that remains a
//! valid, mergeable partial result.

use std::cell::RefCell;
use std::collections::BTreeMap;

use bch_primitives::ec::{KeyId, PublicKey};
use bch_script::interpreter::{
    eval_script, verify_script, NullSignatureChecker, ScriptFlags, SignatureChecker,
};
use bch_script::opcodes::{encode_op_n, OP_0};
use bch_script::{solve, Script, ScriptId, TemplateKind};
use bch_transaction::{Transaction, TransactionInput, TransactionOutput};

use crate::creator::{SignatureCreator, TransactionSignatureChecker, TransactionSignatureCreator};
use crate::provider::SigningProvider;

// -----------------------------------------------------------------------
// SignatureData
// -----------------------------------------------------------------------

/// A public key paired with a stack-ready signature (DER bytes followed by
/// the sighash-type byte).
///
/// The public key is best-effort: signing only needs the key identifier,
/// so a pair produced by a provider that cannot serve `get_pubkey` carries
/// `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigPair {
    /// The signing public key, when known.
    pub pubkey: Option<PublicKey>,
    /// DER-encoded signature with the trailing sighash-type byte.
    pub sig: Vec<u8>,
}

/// Everything discovered or produced while trying to satisfy one locking
/// script.
///
/// All fields grow monotonically over a signing attempt except on full
/// replacement by a completed peer in [`SignatureData::merge_signature_data`].
/// When `complete` is true, `script_sig` alone satisfies the locking script
/// under the standard verify flags.
#[derive(Clone, Debug, Default)]
pub struct SignatureData {
    /// True iff `script_sig` fully satisfies the locking script.
    pub complete: bool,
    /// Candidate or final unlocking script.
    pub script_sig: Script,
    /// The embedded script for script-hash outputs (empty if none).
    pub redeem_script: Script,
    /// Partial signatures, keyed by the signing pubkey's identifier.
    pub signatures: BTreeMap<KeyId, SigPair>,
    /// Public keys seen but not yet matched to a signature.
    pub misc_pubkeys: BTreeMap<KeyId, PublicKey>,
}

impl SignatureData {
    /// Create an empty, incomplete record.
    ///
    /// # Returns
    /// A fresh `SignatureData`.
    pub fn new() -> Self {
        SignatureData::default()
    }

    /// Merge another record into this one.
    ///
    /// A complete self absorbs nothing; a complete other replaces self
    /// wholesale. Between two partials, the redeem script is adopted if
    /// missing and the signature maps union with existing entries winning.
    ///
    /// # Arguments
    /// * `sigdata` - The record to merge in.
    pub fn merge_signature_data(&mut self, sigdata: SignatureData) {
        if self.complete {
            return;
        }
        if sigdata.complete {
            *self = sigdata;
            return;
        }
        if self.redeem_script.is_empty() && !sigdata.redeem_script.is_empty() {
            self.redeem_script = sigdata.redeem_script;
        }
        for (key_id, pair) in sigdata.signatures {
            self.signatures.entry(key_id).or_insert(pair);
        }
    }
}

// -----------------------------------------------------------------------
// Lookup helpers
// -----------------------------------------------------------------------

/// Find an embedded script via the provider, falling back to a redeem
/// script already recorded in the signature data.
fn lookup_script(
    provider: &dyn SigningProvider,
    sigdata: &SignatureData,
    script_id: &ScriptId,
) -> Option<Script> {
    if let Some(script) = provider.get_script(script_id) {
        return Some(script);
    }
    if !sigdata.redeem_script.is_empty() && sigdata.redeem_script.script_id() == *script_id {
        return Some(sigdata.redeem_script.clone());
    }
    None
}

/// Best-effort public key lookup: the provider first (recording a hit in
/// `misc_pubkeys`), then pairs already in `signatures`, then `misc_pubkeys`.
fn lookup_pubkey(
    provider: &dyn SigningProvider,
    sigdata: &mut SignatureData,
    key_id: &KeyId,
) -> Option<PublicKey> {
    if let Some(pubkey) = provider.get_pubkey(key_id) {
        sigdata.misc_pubkeys.insert(pubkey.key_id(), pubkey.clone());
        return Some(pubkey);
    }
    if let Some(pair) = sigdata.signatures.get(key_id) {
        if pair.pubkey.is_some() {
            return pair.pubkey.clone();
        }
    }
    sigdata.misc_pubkeys.get(key_id).cloned()
}

/// Produce (or reuse) one signature for `key_id` over `script_code`.
///
/// An entry already in `sigdata.signatures` is reused without re-signing,
/// which lets a later signer finish a half-signed input. A fresh signature
/// is recorded before being returned.
fn create_sig(
    creator: &dyn SignatureCreator,
    sigdata: &mut SignatureData,
    provider: &dyn SigningProvider,
    key_id: &KeyId,
    script_code: &Script,
) -> Option<Vec<u8>> {
    if let Some(pair) = sigdata.signatures.get(key_id) {
        return Some(pair.sig.clone());
    }
    let pubkey = lookup_pubkey(provider, sigdata, key_id);
    if let Some(sig) = creator.create_sig(provider, key_id, script_code) {
        let previous = sigdata
            .signatures
            .insert(*key_id, SigPair { pubkey, sig: sig.clone() });
        debug_assert!(previous.is_none(), "fresh signature insert collided");
        return Some(sig);
    }
    None
}

// -----------------------------------------------------------------------
// SignStep
// -----------------------------------------------------------------------

/// Satisfy one level of a locking script.
///
/// Returns whether the template was fully satisfied, the recognized
/// template, and the stack items gathered so far. For `ScriptHash` the
/// single item is the embedded redeem script (the caller recurses). The
/// stack is returned even on failure so partial multisig progress reaches
/// the assembled scriptSig.
fn sign_step(
    provider: &dyn SigningProvider,
    creator: &dyn SignatureCreator,
    script_pub_key: &Script,
    sigdata: &mut SignatureData,
) -> (bool, TemplateKind, Vec<Vec<u8>>) {
    let mut ret: Vec<Vec<u8>> = Vec::new();
    let (which, solutions) = solve(script_pub_key);

    match which {
        TemplateKind::Nonstandard | TemplateKind::NullData => (false, which, ret),

        TemplateKind::PubKey => {
            let key_id = KeyId::of(&solutions[0]);
            match create_sig(creator, sigdata, provider, &key_id, script_pub_key) {
                Some(sig) => {
                    ret.push(sig);
                    (true, which, ret)
                }
                None => (false, which, ret),
            }
        }

        TemplateKind::PubKeyHash => {
            let Ok(key_id) = KeyId::from_bytes(&solutions[0]) else {
                return (false, which, ret);
            };
            match create_sig(creator, sigdata, provider, &key_id, script_pub_key) {
                Some(sig) => {
                    ret.push(sig);
                    // The pubkey itself must be revealed. A provider miss
                    // pushes an empty item; verification then fails and
                    // the attempt stays incomplete.
                    let pubkey_item = provider
                        .get_pubkey(&key_id)
                        .map(|pk| pk.to_compressed().to_vec())
                        .unwrap_or_default();
                    ret.push(pubkey_item);
                    (true, which, ret)
                }
                None => (false, which, ret),
            }
        }

        TemplateKind::ScriptHash => {
            let Ok(script_id) = ScriptId::from_bytes(&solutions[0]) else {
                return (false, which, ret);
            };
            match lookup_script(provider, sigdata, &script_id) {
                Some(script) => {
                    ret.push(script.to_bytes().to_vec());
                    (true, which, ret)
                }
                None => (false, which, ret),
            }
        }

        TemplateKind::Multisig => {
            let required = solutions[0][0] as usize;
            // CHECKMULTISIG pops one item more than it should.
            ret.push(Vec::new());
            for pubkey_bytes in &solutions[1..solutions.len() - 1] {
                let key_id = KeyId::of(pubkey_bytes);
                if ret.len() < required + 1 {
                    if let Some(sig) =
                        create_sig(creator, sigdata, provider, &key_id, script_pub_key)
                    {
                        ret.push(sig);
                    }
                }
            }
            let ok = ret.len() == required + 1;
            while ret.len() < required + 1 {
                ret.push(Vec::new());
            }
            (ok, which, ret)
        }
    }
}

/// Push-encode stack items into a script with minimal encodings.
fn push_all(values: &[Vec<u8>]) -> Script {
    let mut result = Script::new();
    for value in values {
        if value.is_empty() {
            let _ = result.append_opcodes(&[OP_0]);
        } else if value.len() == 1 && value[0] >= 1 && value[0] <= 16 {
            let _ = result.append_opcodes(&[encode_op_n(value[0])]);
        } else {
            let _ = result.append_push_data(value);
        }
    }
    result
}

// -----------------------------------------------------------------------
// ProduceSignature
// -----------------------------------------------------------------------

/// Produce a scriptSig satisfying `from_pub_key`, as far as the provider
/// allows.
///
/// Runs the template signer, unwraps one level of P2SH (rejecting a redeem
/// script that is itself P2SH), assembles the scriptSig from the gathered
/// stack, and decides `complete` by verifying the assembly against the
/// locking script under the standard flags. Idempotent: a complete record
/// returns immediately.
///
/// # Arguments
/// * `provider` - Key and script lookup.
/// * `creator` - The signature creator (real or dummy).
/// * `from_pub_key` - The locking script to satisfy.
/// * `sigdata` - Accumulated signing state, updated in place.
///
/// # Returns
/// `true` iff the scriptSig is complete and verified.
pub fn produce_signature(
    provider: &dyn SigningProvider,
    creator: &dyn SignatureCreator,
    from_pub_key: &Script,
    sigdata: &mut SignatureData,
) -> bool {
    if sigdata.complete {
        return true;
    }

    let (mut solved, which, mut result) = sign_step(provider, creator, from_pub_key, sigdata);

    if solved && which == TemplateKind::ScriptHash {
        // The single item is the redeem script; satisfying it yields the
        // real stack, and the serialized redeem script goes on last.
        let subscript = Script::from_bytes(&result[0]);
        sigdata.redeem_script = subscript.clone();

        let (inner_solved, inner_which, inner_result) =
            sign_step(provider, creator, &subscript, sigdata);
        solved = inner_solved && inner_which != TemplateKind::ScriptHash;
        result = inner_result;
        result.push(subscript.to_bytes().to_vec());
    }

    sigdata.script_sig = push_all(&result);

    // The signer never trusts its own partial results; completion is what
    // the consensus engine accepts.
    sigdata.complete = solved
        && verify_script(
            &sigdata.script_sig,
            from_pub_key,
            ScriptFlags::STANDARD_VERIFY_FLAGS,
            creator.checker(),
        )
        .is_ok();
    sigdata.complete
}

/// Commit assembled signature data into a transaction input.
///
/// # Arguments
/// * `input` - The input to update.
/// * `data` - The signature data whose scriptSig to install.
pub fn update_input(input: &mut TransactionInput, data: &SignatureData) {
    input.unlocking_script = if data.script_sig.is_empty() {
        None
    } else {
        Some(data.script_sig.clone())
    };
}

/// Sign one input of a transaction against the given locking script.
///
/// Builds a transaction-bound creator, runs [`produce_signature`], and
/// installs whatever scriptSig resulted (complete or partial).
///
/// # Arguments
/// * `provider` - Key and script lookup.
/// * `from_pub_key` - The locking script of the output being spent.
/// * `tx` - The transaction to sign; its input is updated in place.
/// * `n_in` - Index of the input to sign.
/// * `satoshis` - Value of the output being spent.
/// * `sighash_type` - The sighash flags to commit to.
///
/// # Returns
/// `true` iff the input is now fully signed.
pub fn sign_input(
    provider: &dyn SigningProvider,
    from_pub_key: &Script,
    tx: &mut Transaction,
    n_in: usize,
    satoshis: u64,
    sighash_type: u32,
) -> bool {
    debug_assert!(n_in < tx.inputs.len());

    // The FORKID digest never commits to the spending input's scriptSig,
    // so signing against a snapshot is equivalent to signing in place.
    let tx_snapshot = tx.clone();
    let creator = TransactionSignatureCreator::new(&tx_snapshot, n_in, satoshis, sighash_type);

    let mut sigdata = SignatureData::new();
    let ret = produce_signature(provider, &creator, from_pub_key, &mut sigdata);
    update_input(&mut tx.inputs[n_in], &sigdata);
    ret
}

// -----------------------------------------------------------------------
// DataFromTransaction
// -----------------------------------------------------------------------

/// A checker that wraps the real transaction checker and records every
/// accepted (pubkey, signature) pair into the shared signature data.
struct SignatureExtractorChecker<'a> {
    sigdata: &'a RefCell<SignatureData>,
    checker: &'a TransactionSignatureChecker<'a>,
}

impl SignatureChecker for SignatureExtractorChecker<'_> {
    fn check_sig(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        script_code: &Script,
        flags: ScriptFlags,
    ) -> bool {
        if self.checker.check_sig(full_sig, pub_key, script_code, flags) {
            if let Ok(pubkey) = PublicKey::from_bytes(pub_key) {
                self.sigdata.borrow_mut().signatures.insert(
                    KeyId::of(pub_key),
                    SigPair { pubkey: Some(pubkey), sig: full_sig.to_vec() },
                );
            }
            return true;
        }
        false
    }
}

/// Recover signature data from an existing (possibly partial) scriptSig.
///
/// Verifies the scriptSig with a recording checker; success means the
/// input is complete and every checked signature was captured. Otherwise
/// the output script is solved, one P2SH level is unwrapped from the
/// recovered stack, and multisig partials are matched to their pubkeys in
/// a deterministic left-to-right walk.
///
/// # Arguments
/// * `tx` - The transaction holding the scriptSig.
/// * `n_in` - Index of the input to extract from.
/// * `txout` - The output being spent by that input.
///
/// # Returns
/// The recovered `SignatureData`.
pub fn data_from_transaction(
    tx: &Transaction,
    n_in: usize,
    txout: &TransactionOutput,
) -> SignatureData {
    debug_assert!(n_in < tx.inputs.len());

    let mut data = SignatureData::new();
    data.script_sig = tx.inputs[n_in].unlocking_script.clone().unwrap_or_default();

    // Recover the pushed stack from the existing scriptSig.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let _ = eval_script(
        &mut stack,
        &data.script_sig,
        ScriptFlags::MANDATORY_VERIFY_FLAGS,
        &NullSignatureChecker,
    );

    // Get signatures
    let tx_checker = TransactionSignatureChecker::new(tx, n_in, txout.satoshis);
    let script_sig = data.script_sig.clone();
    let cell = RefCell::new(data);
    let extractor = SignatureExtractorChecker { sigdata: &cell, checker: &tx_checker };

    if verify_script(
        &script_sig,
        &txout.locking_script,
        ScriptFlags::STANDARD_VERIFY_FLAGS,
        &extractor,
    )
    .is_ok()
    {
        let mut data = cell.into_inner();
        data.complete = true;
        return data;
    }

    // Get scripts
    let (mut script_type, mut solutions) = solve(&txout.locking_script);
    let mut next_script = txout.locking_script.clone();

    if script_type == TemplateKind::ScriptHash
        && !stack.is_empty()
        && !stack.last().unwrap().is_empty()
    {
        // The stack top is the redeem script.
        let redeem_bytes = stack.pop().unwrap();
        let redeem_script = Script::from_bytes(&redeem_bytes);
        cell.borrow_mut().redeem_script = redeem_script.clone();
        next_script = redeem_script;

        let solved = solve(&next_script);
        script_type = solved.0;
        solutions = solved.1;
    }

    if script_type == TemplateKind::Multisig && !stack.is_empty() {
        // Match sigs to pubkeys left to right; the cursor only advances,
        // so the same inputs always yield the same partial-sig map.
        debug_assert!(solutions.len() > 1);
        let num_pubkeys = solutions.len() - 2;
        let mut last_success_key = 0usize;
        for sig in &stack {
            for i in last_success_key..num_pubkeys {
                let pubkey = &solutions[i + 1];
                let already = cell.borrow().signatures.contains_key(&KeyId::of(pubkey));
                if already
                    || extractor.check_sig(
                        sig,
                        pubkey,
                        &next_script,
                        ScriptFlags::STANDARD_VERIFY_FLAGS,
                    )
                {
                    last_success_key = i + 1;
                    break;
                }
            }
        }
    }

    cell.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::DummySignatureCreator;
    use crate::provider::MemorySigningProvider;
    use bch_primitives::ec::PrivateKey;
    use bch_script::opcodes::*;
    use bch_transaction::sighash::SIGHASH_ALL_FORKID;

    fn p2pkh_script(key_id: &KeyId) -> Script {
        let mut script = Script::new();
        script.append_opcodes(&[OP_DUP, OP_HASH160]).unwrap();
        script.append_push_data(key_id.as_bytes()).unwrap();
        script.append_opcodes(&[OP_EQUALVERIFY, OP_CHECKSIG]).unwrap();
        script
    }

    fn multisig_script(required: u8, pubkeys: &[PublicKey]) -> Script {
        let mut script = Script::new();
        script.append_opcodes(&[encode_op_n(required)]).unwrap();
        for pk in pubkeys {
            script.append_push_data(&pk.to_compressed()).unwrap();
        }
        script
            .append_opcodes(&[encode_op_n(pubkeys.len() as u8), OP_CHECKMULTISIG])
            .unwrap();
        script
    }

    fn p2sh_script(redeem: &Script) -> Script {
        let mut script = Script::new();
        script.append_opcodes(&[OP_HASH160]).unwrap();
        script.append_push_data(redeem.script_id().as_bytes()).unwrap();
        script.append_opcodes(&[OP_EQUAL]).unwrap();
        script
    }

    fn spending_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(bch_transaction::TransactionInput::spending([0x77; 32], 1));
        tx.add_output(TransactionOutput::locking(99_000, Script::new()));
        tx
    }

    /// A provider that serves private keys but cannot serve pubkeys,
    /// exercising the empty-pubkey-push path.
    struct KeyOnlyProvider(MemorySigningProvider);

    impl SigningProvider for KeyOnlyProvider {
        fn get_key(&self, key_id: &KeyId) -> Option<PrivateKey> {
            self.0.get_key(key_id)
        }
        fn get_pubkey(&self, _key_id: &KeyId) -> Option<PublicKey> {
            None
        }
        fn get_script(&self, script_id: &ScriptId) -> Option<Script> {
            self.0.get_script(script_id)
        }
    }

    /// Signing a P2PKH output with the key present completes and yields
    /// `<sig> <pubkey>`.
    #[test]
    fn test_sign_p2pkh_complete() {
        let tx = spending_tx();
        let mut provider = MemorySigningProvider::new();
        let key = PrivateKey::new();
        let pubkey = key.pub_key();
        let key_id = provider.add_key(key);

        let lock = p2pkh_script(&key_id);
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(produce_signature(&provider, &creator, &lock, &mut sigdata));
        assert!(sigdata.complete);
        assert_eq!(sigdata.signatures.len(), 1);
        assert!(sigdata.signatures.contains_key(&key_id));

        // scriptSig ends with the compressed pubkey push
        let chunks = sigdata.script_sig.chunks().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].data.as_deref(), Some(&pubkey.to_compressed()[..]));
    }

    /// Signing with an empty provider fails and records nothing.
    #[test]
    fn test_sign_p2pkh_missing_key() {
        let tx = spending_tx();
        let provider = MemorySigningProvider::new();
        let key_id = PrivateKey::new().pub_key().key_id();

        let lock = p2pkh_script(&key_id);
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(!produce_signature(&provider, &creator, &lock, &mut sigdata));
        assert!(!sigdata.complete);
        assert!(sigdata.signatures.is_empty());
    }

    /// A provider that signs but cannot reveal the pubkey leaves an empty
    /// pubkey push and an incomplete result (source behavior, pinned).
    #[test]
    fn test_p2pkh_missing_pubkey_pushes_empty() {
        let tx = spending_tx();
        let mut inner = MemorySigningProvider::new();
        let key = PrivateKey::new();
        let key_id = inner.add_key(key);
        let provider = KeyOnlyProvider(inner);

        let lock = p2pkh_script(&key_id);
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(!produce_signature(&provider, &creator, &lock, &mut sigdata));
        assert!(!sigdata.complete);
        // The signature was still produced and recorded
        assert_eq!(sigdata.signatures.len(), 1);
        // The assembled scriptSig carries <sig> OP_0
        let chunks = sigdata.script_sig.chunks().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].op, OP_0);
        assert_eq!(chunks[1].data, None);
    }

    /// Signing a P2PK output pushes only the signature.
    #[test]
    fn test_sign_p2pk() {
        let tx = spending_tx();
        let mut provider = MemorySigningProvider::new();
        let key = PrivateKey::new();
        let pubkey = key.pub_key();
        provider.add_key(key);

        let mut lock = Script::new();
        lock.append_push_data(&pubkey.to_compressed()).unwrap();
        lock.append_opcodes(&[OP_CHECKSIG]).unwrap();

        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(produce_signature(&provider, &creator, &lock, &mut sigdata));
        let chunks = sigdata.script_sig.chunks().unwrap();
        assert_eq!(chunks.len(), 1);
    }

    /// Nonstandard and null-data outputs cannot be signed.
    #[test]
    fn test_sign_unsatisfiable_templates() {
        let tx = spending_tx();
        let provider = MemorySigningProvider::new();
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);

        let mut sigdata = SignatureData::new();
        let null_data = Script::from_bytes(&[OP_RETURN, 0x01, 0xaa]);
        assert!(!produce_signature(&provider, &creator, &null_data, &mut sigdata));

        let mut sigdata = SignatureData::new();
        let nonstandard = Script::from_bytes(&[OP_DUP, OP_DROP, OP_1]);
        assert!(!produce_signature(&provider, &creator, &nonstandard, &mut sigdata));
    }

    /// produce_signature is idempotent: a complete record is returned
    /// unchanged without re-signing.
    #[test]
    fn test_produce_signature_idempotent() {
        let tx = spending_tx();
        let mut provider = MemorySigningProvider::new();
        let key_id = provider.add_key(PrivateKey::new());

        let lock = p2pkh_script(&key_id);
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(produce_signature(&provider, &creator, &lock, &mut sigdata));
        let first = sigdata.clone();
        // Second run with an empty provider must still report complete and
        // leave the record untouched.
        let empty = MemorySigningProvider::new();
        assert!(produce_signature(&empty, &creator, &lock, &mut sigdata));
        assert_eq!(sigdata.script_sig, first.script_sig);
        assert_eq!(sigdata.signatures, first.signatures);
    }

    /// One signer of a P2SH 2-of-3 leaves a partial: one recorded
    /// signature, the redeem script, and a scriptSig with placeholders.
    #[test]
    fn test_p2sh_multisig_partial_then_complete() {
        let tx = spending_tx();
        let keys: Vec<PrivateKey> = (0..3).map(|_| PrivateKey::new()).collect();
        let pubkeys: Vec<PublicKey> = keys.iter().map(PrivateKey::pub_key).collect();
        let redeem = multisig_script(2, &pubkeys);
        let lock = p2sh_script(&redeem);

        // First signer holds key 0 and the redeem script.
        let mut provider1 = MemorySigningProvider::new();
        provider1.add_key(keys[0].clone());
        provider1.add_script(redeem.clone());

        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(!produce_signature(&provider1, &creator, &lock, &mut sigdata));
        assert!(!sigdata.complete);
        assert_eq!(sigdata.redeem_script, redeem);
        assert_eq!(sigdata.signatures.len(), 1);
        assert!(sigdata.signatures.contains_key(&pubkeys[0].key_id()));

        // Assembled partial: OP_0 <sig1> OP_0 <redeem>
        let chunks = sigdata.script_sig.chunks().unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].op, OP_0);
        assert_eq!(chunks[2].op, OP_0);
        assert_eq!(chunks[3].data.as_deref(), Some(redeem.to_bytes()));

        // Second signer holds only key 1; the redeem script rides in on
        // the signature data.
        let mut provider2 = MemorySigningProvider::new();
        provider2.add_key(keys[1].clone());

        assert!(produce_signature(&provider2, &creator, &lock, &mut sigdata));
        assert!(sigdata.complete);
        assert_eq!(sigdata.signatures.len(), 2);

        // Final scriptSig: OP_0 <sig1> <sig2> <redeem>
        let chunks = sigdata.script_sig.chunks().unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].op, OP_0);
        assert!(chunks[1].data.is_some());
        assert!(chunks[2].data.is_some());
        assert_eq!(chunks[3].data.as_deref(), Some(redeem.to_bytes()));
    }

    /// A redeem script that is itself P2SH is rejected (no nested P2SH).
    #[test]
    fn test_nested_p2sh_rejected() {
        let tx = spending_tx();
        let mut provider = MemorySigningProvider::new();
        let key_id = provider.add_key(PrivateKey::new());

        let innermost = p2pkh_script(&key_id);
        let inner = p2sh_script(&innermost);
        provider.add_script(innermost);
        provider.add_script(inner.clone());
        let lock = p2sh_script(&inner);

        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();
        assert!(!produce_signature(&provider, &creator, &lock, &mut sigdata));
        assert!(!sigdata.complete);
    }

    /// The dummy creator completes any P2PKH with a fixed-size signature
    /// that upper-bounds the real one.
    #[test]
    fn test_dummy_upper_bounds_real() {
        let tx = spending_tx();
        let mut provider = MemorySigningProvider::new();
        let key_id = provider.add_key(PrivateKey::new());
        let lock = p2pkh_script(&key_id);

        let mut real = SignatureData::new();
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        assert!(produce_signature(&provider, &creator, &lock, &mut real));

        let mut dummy = SignatureData::new();
        assert!(produce_signature(&provider, &DummySignatureCreator, &lock, &mut dummy));

        assert!(real.script_sig.len() <= dummy.script_sig.len());
    }

    /// sign_input installs the scriptSig on the transaction and a
    /// round-trip through data_from_transaction recovers completeness.
    #[test]
    fn test_sign_input_and_extract() {
        let mut tx = spending_tx();
        let mut provider = MemorySigningProvider::new();
        let key = PrivateKey::new();
        let pubkey = key.pub_key();
        let key_id = provider.add_key(key);

        let lock = p2pkh_script(&key_id);
        let utxo = TransactionOutput::locking(50_000, lock.clone());

        assert!(sign_input(
            &provider,
            &lock,
            &mut tx,
            0,
            50_000,
            SIGHASH_ALL_FORKID
        ));
        assert!(tx.inputs[0].unlocking_script.is_some());

        let data = data_from_transaction(&tx, 0, &utxo);
        assert!(data.complete);
        assert_eq!(data.signatures.len(), 1);
        let pair = &data.signatures[&key_id];
        assert_eq!(pair.pubkey.as_ref().unwrap(), &pubkey);
    }

    /// Extraction from an unsigned input yields an empty partial.
    #[test]
    fn test_extract_unsigned_input() {
        let tx = spending_tx();
        let utxo = TransactionOutput::locking(
            50_000,
            p2pkh_script(&PrivateKey::new().pub_key().key_id()),
        );
        let data = data_from_transaction(&tx, 0, &utxo);
        assert!(!data.complete);
        assert!(data.signatures.is_empty());
        assert!(data.script_sig.is_empty());
    }

    /// Extraction of a partial P2SH multisig recovers the redeem script
    /// and the one present signature.
    #[test]
    fn test_extract_partial_multisig() {
        let mut tx = spending_tx();
        let keys: Vec<PrivateKey> = (0..3).map(|_| PrivateKey::new()).collect();
        let pubkeys: Vec<PublicKey> = keys.iter().map(PrivateKey::pub_key).collect();
        let redeem = multisig_script(2, &pubkeys);
        let lock = p2sh_script(&redeem);
        let utxo = TransactionOutput::locking(50_000, lock.clone());

        let mut provider = MemorySigningProvider::new();
        provider.add_key(keys[1].clone());
        provider.add_script(redeem.clone());

        assert!(!sign_input(
            &provider,
            &lock,
            &mut tx,
            0,
            50_000,
            SIGHASH_ALL_FORKID
        ));

        let data = data_from_transaction(&tx, 0, &utxo);
        assert!(!data.complete);
        assert_eq!(data.redeem_script, redeem);
        assert_eq!(data.signatures.len(), 1);
        assert!(data.signatures.contains_key(&pubkeys[1].key_id()));
    }

    /// Merging partials is monotone; merging a complete record absorbs it.
    #[test]
    fn test_merge_signature_data() {
        let key_a = PrivateKey::new().pub_key();
        let key_b = PrivateKey::new().pub_key();
        let pair_a = SigPair { pubkey: Some(key_a.clone()), sig: vec![0x01] };
        let pair_b = SigPair { pubkey: Some(key_b.clone()), sig: vec![0x02] };

        let mut a = SignatureData::new();
        a.signatures.insert(key_a.key_id(), pair_a.clone());

        let mut b = SignatureData::new();
        b.signatures.insert(key_b.key_id(), pair_b.clone());
        b.redeem_script = Script::from_bytes(&[OP_1]);

        let mut merged_ab = a.clone();
        merged_ab.merge_signature_data(b.clone());
        let mut merged_ba = b.clone();
        merged_ba.merge_signature_data(a.clone());

        assert_eq!(merged_ab.signatures, merged_ba.signatures);
        assert_eq!(merged_ab.redeem_script, merged_ba.redeem_script);
        assert_eq!(merged_ab.signatures.len(), 2);

        // Completion absorption
        let mut complete = SignatureData::new();
        complete.complete = true;
        complete.script_sig = Script::from_bytes(&[OP_1]);

        let mut target = a.clone();
        target.merge_signature_data(complete.clone());
        assert!(target.complete);
        assert_eq!(target.script_sig, complete.script_sig);

        let mut kept = complete.clone();
        kept.merge_signature_data(b);
        assert_eq!(kept.signatures.len(), 0);
        assert!(kept.complete);
    }

    /// A multisig stack always has exactly m+1 items with a leading empty
    /// item, even when no key is available.
    #[test]
    fn test_multisig_stack_shape() {
        let tx = spending_tx();
        let pubkeys: Vec<PublicKey> =
            (0..3).map(|_| PrivateKey::new().pub_key()).collect();
        let lock = multisig_script(2, &pubkeys);

        let provider = MemorySigningProvider::new();
        let creator = TransactionSignatureCreator::new(&tx, 0, 50_000, SIGHASH_ALL_FORKID);
        let mut sigdata = SignatureData::new();

        assert!(!produce_signature(&provider, &creator, &lock, &mut sigdata));
        // OP_0 plus two empty placeholders
        let chunks = sigdata.script_sig.chunks().unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.op == OP_0));
    }
}
