use proptest::prelude::*;

use bch_script::interpreter::{eval_script, NullSignatureChecker, ScriptFlags};
use bch_script::{solve, Script};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn script_bytes_roundtrip(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let script = Script::from_bytes(&data);
        prop_assert_eq!(&data[..], script.to_bytes());
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let script2 = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(script.to_bytes(), script2.to_bytes());
    }

    #[test]
    fn push_data_roundtrip(data in prop::collection::vec(any::<u8>(), 0..300)) {
        let mut script = Script::new();
        script.append_push_data(&data).unwrap();
        prop_assert!(script.is_push_only());

        let chunks = script.chunks().unwrap();
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0].data.as_deref().unwrap_or(&[]), &data[..]);
    }

    #[test]
    fn solver_never_panics(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let script = Script::from_bytes(&data);
        let _ = solve(&script);
        let _ = script.is_push_only();
        let _ = script.to_asm();
    }

    #[test]
    fn eval_push_only_recovers_items(items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..8)) {
        let mut script = Script::new();
        for item in &items {
            script.append_push_data(item).unwrap();
        }

        let mut stack = Vec::new();
        eval_script(
            &mut stack,
            &script,
            ScriptFlags::MANDATORY_VERIFY_FLAGS,
            &NullSignatureChecker,
        )
        .unwrap();
        prop_assert_eq!(stack, items);
    }
}
