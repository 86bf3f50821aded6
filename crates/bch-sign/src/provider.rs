//! Signing providers - read-only key and script lookup.
//!
//! A signing provider answers three questions: which private key belongs
//! to a key identifier, which public key belongs to it, and which embedded
//! script a script identifier refers to. Any lookup may miss; a miss is a
//! normal, non-error result that simply leaves the affected branch of a
//! signing attempt unsatisfied.

use std::collections::BTreeMap;

use bch_primitives::ec::{KeyId, PrivateKey, PublicKey};
use bch_script::{Script, ScriptId};

/// Read-only lookup capability consumed by the signing code.
///
/// Implementations are never mutated by the core and are expected to be
/// safe for concurrent reads. An empty provider is a valid provider (used
/// by the dummy-signer path).
pub trait SigningProvider {
    /// Look up the private key for a key identifier.
    ///
    /// # Arguments
    /// * `key_id` - The Hash160 of the serialized public key.
    ///
    /// # Returns
    /// The private key, or `None` if this provider does not hold it.
    fn get_key(&self, key_id: &KeyId) -> Option<PrivateKey>;

    /// Look up the public key for a key identifier.
    ///
    /// # Arguments
    /// * `key_id` - The Hash160 of the serialized public key.
    ///
    /// # Returns
    /// The public key, or `None` if this provider does not hold it.
    fn get_pubkey(&self, key_id: &KeyId) -> Option<PublicKey>;

    /// Look up an embedded (redeem) script by its identifier.
    ///
    /// # Arguments
    /// * `script_id` - The Hash160 of the serialized script.
    ///
    /// # Returns
    /// The script, or `None` if this provider does not hold it.
    fn get_script(&self, script_id: &ScriptId) -> Option<Script>;
}

/// An in-memory signing provider backed by plain maps.
///
/// Keys are indexed by the identifier of their derived public key, scripts
/// by their script identifier. `MemorySigningProvider::new()` doubles as
/// the empty provider.
#[derive(Default)]
pub struct MemorySigningProvider {
    keys: BTreeMap<KeyId, PrivateKey>,
    scripts: BTreeMap<ScriptId, Script>,
}

impl MemorySigningProvider {
    /// Create an empty provider.
    ///
    /// # Returns
    /// A provider holding no keys and no scripts.
    pub fn new() -> Self {
        MemorySigningProvider::default()
    }

    /// Store a private key, indexed by its derived public key's identifier.
    ///
    /// # Arguments
    /// * `key` - The private key to store.
    ///
    /// # Returns
    /// The `KeyId` under which the key was stored.
    pub fn add_key(&mut self, key: PrivateKey) -> KeyId {
        let key_id = key.pub_key().key_id();
        self.keys.insert(key_id, key);
        key_id
    }

    /// Store an embedded script, indexed by its identifier.
    ///
    /// # Arguments
    /// * `script` - The script to store.
    ///
    /// # Returns
    /// The `ScriptId` under which the script was stored.
    pub fn add_script(&mut self, script: Script) -> ScriptId {
        let script_id = script.script_id();
        self.scripts.insert(script_id, script);
        script_id
    }
}

impl SigningProvider for MemorySigningProvider {
    fn get_key(&self, key_id: &KeyId) -> Option<PrivateKey> {
        self.keys.get(key_id).cloned()
    }

    fn get_pubkey(&self, key_id: &KeyId) -> Option<PublicKey> {
        self.keys.get(key_id).map(PrivateKey::pub_key)
    }

    fn get_script(&self, script_id: &ScriptId) -> Option<Script> {
        self.scripts.get(script_id).cloned()
    }
}
