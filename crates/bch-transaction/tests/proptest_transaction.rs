use proptest::prelude::*;

use bch_script::Script;
use bch_transaction::sighash::{signature_hash, SIGHASH_ALL_FORKID};
use bch_transaction::{Transaction, TransactionInput, TransactionOutput};

fn arbitrary_tx() -> impl Strategy<Value = Transaction> {
    (
        1u32..=2,
        prop::collection::vec((prop::array::uniform32(any::<u8>()), any::<u32>()), 1..4),
        prop::collection::vec((any::<u64>(), prop::collection::vec(any::<u8>(), 0..64)), 1..4),
        any::<u32>(),
    )
        .prop_map(|(version, ins, outs, lock_time)| {
            let mut tx = Transaction::new();
            tx.version = version;
            tx.lock_time = lock_time;
            for (txid, vout) in ins {
                tx.add_input(TransactionInput::spending(txid, vout));
            }
            for (satoshis, script) in outs {
                tx.add_output(TransactionOutput::locking(satoshis, Script::from_bytes(&script)));
            }
            tx
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn tx_serialization_roundtrip(tx in arbitrary_tx()) {
        let bytes = tx.to_bytes();
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(parsed.to_bytes(), bytes);
        prop_assert_eq!(parsed.tx_id(), tx.tx_id());
    }

    #[test]
    fn tx_hex_roundtrip(tx in arbitrary_tx()) {
        let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
        prop_assert_eq!(parsed.to_hex(), tx.to_hex());
    }

    #[test]
    fn sighash_is_deterministic(tx in arbitrary_tx(), script_code in prop::collection::vec(any::<u8>(), 0..64), satoshis in any::<u64>()) {
        let a = signature_hash(&tx, 0, &script_code, SIGHASH_ALL_FORKID, satoshis).unwrap();
        let b = signature_hash(&tx, 0, &script_code, SIGHASH_ALL_FORKID, satoshis).unwrap();
        prop_assert_eq!(a, b);
    }
}
