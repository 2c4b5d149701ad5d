//! Property-based tests for egloo_log using proptest

use egloo_log::prelude::*;
use egloo_log::{bind_values, clear_bit, has_bit, set_bit, MISSING_VALUE};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

fn flat_args(keys: &[String], values: &[i64]) -> Vec<Value> {
    let mut args = Vec::new();
    for (i, key) in keys.iter().enumerate() {
        args.push(Value::from(key.as_str()));
        if let Some(v) = values.get(i) {
            args.push(Value::from(*v));
        }
    }
    args
}

// ============================================================================
// Field Set Builder
// ============================================================================

proptest! {
    /// Odd-length input: the last key holds the sentinel and there are (len+1)/2 entries
    #[test]
    fn test_odd_length_pads_missing(
        keys in prop::collection::hash_set("[a-z]{1,8}", 1..12)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let values: Vec<i64> = (0..keys.len() as i64 - 1).collect();
        let args = flat_args(&keys, &values);
        prop_assert_eq!(args.len() % 2, 1);

        let expected_len = (args.len() + 1) / 2;
        let fields = Fields::try_from_flat(args).unwrap();

        prop_assert_eq!(fields.len(), expected_len);
        let last = keys.last().unwrap();
        prop_assert_eq!(
            fields.get(last).and_then(Value::as_static),
            Some(&FieldValue::Missing)
        );
        prop_assert_eq!(FieldValue::Missing.to_string(), MISSING_VALUE);
    }

    /// Even-length input with unique keys maps exactly to its consecutive pairs
    #[test]
    fn test_even_length_is_exact(
        pairs in prop::collection::hash_map("[a-z]{1,8}", any::<i64>(), 0..12)
    ) {
        let keys: Vec<String> = pairs.keys().cloned().collect();
        let values: Vec<i64> = keys.iter().map(|k| pairs[k]).collect();
        let fields = Fields::try_from_flat(flat_args(&keys, &values)).unwrap();

        prop_assert_eq!(fields.len(), pairs.len());
        for (key, value) in &pairs {
            prop_assert_eq!(
                fields.get(key).and_then(Value::as_static),
                Some(&FieldValue::Int(*value))
            );
        }
    }

    /// With duplicate keys, the last occurrence wins
    #[test]
    fn test_duplicate_keys_last_wins(
        entries in prop::collection::vec(("[a-c]", any::<i64>()), 1..30)
    ) {
        let mut kv = KeyValues::new();
        let mut expected: HashMap<String, i64> = HashMap::new();
        for (key, value) in &entries {
            kv.push(key.as_str(), *value);
            expected.insert(key.clone(), *value);
        }

        let fields = Fields::from_keyvals(kv);
        prop_assert_eq!(fields.len(), expected.len());
        for (key, value) in &expected {
            prop_assert_eq!(
                fields.get(key).and_then(Value::as_static),
                Some(&FieldValue::Int(*value))
            );
        }
    }

    /// A non-string key is rejected with its position
    #[test]
    fn test_non_string_key_rejected(prefix in 0usize..5, bad in any::<i64>()) {
        let mut args = Vec::new();
        for i in 0..prefix {
            args.push(Value::from(format!("k{}", i)));
            args.push(Value::from(i));
        }
        args.push(Value::from(bad));
        args.push(Value::from("v"));

        let err = Fields::try_from_flat(args).unwrap_err();
        let rejected_at_key = matches!(err, LoggerError::InvalidFieldKey { index } if index == prefix * 2);
        prop_assert!(rejected_at_key, "unexpected error {:?}", err);
    }
}

// ============================================================================
// Value Binder
// ============================================================================

proptest! {
    /// Every bind pass invokes each deferred value once, statics are untouched
    #[test]
    fn test_binder_reinvokes_every_pass(passes in 1usize..10, static_value in any::<i64>()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let valuer = Valuer::new(move || FieldValue::from(counter.fetch_add(1, Ordering::SeqCst) + 1));

        for pass in 1..=passes {
            let mut kv = KeyValues::new()
                .with("static", static_value)
                .with("dynamic", valuer.clone());
            bind_values(&mut kv);

            prop_assert_eq!(calls.load(Ordering::SeqCst), pass);
            prop_assert_eq!(
                kv.get("dynamic").and_then(Value::as_static),
                Some(&FieldValue::from(pass))
            );
            prop_assert_eq!(
                kv.get("static").and_then(Value::as_static),
                Some(&FieldValue::Int(static_value))
            );
        }
    }
}

// ============================================================================
// Bit Primitives
// ============================================================================

proptest! {
    #[test]
    fn test_set_then_has(n in any::<u8>(), pos in 0u8..8) {
        prop_assert!(has_bit(set_bit(n, pos), pos));
        prop_assert!(!has_bit(clear_bit(n, pos), pos));
    }

    /// Only bit `pos` ever changes
    #[test]
    fn test_other_bits_untouched(n in any::<u8>(), pos in 0u8..8) {
        let mask = !(1u8 << pos);
        prop_assert_eq!(set_bit(n, pos) & mask, n & mask);
        prop_assert_eq!(clear_bit(n, pos) & mask, n & mask);
    }
}

// ============================================================================
// LogLevel / LevelMask
// ============================================================================

proptest! {
    #[test]
    fn test_level_parse_roundtrip(level in any_level()) {
        prop_assert_eq!(level.to_str().parse::<LogLevel>().unwrap(), level);
        prop_assert_eq!(level.as_json_str().parse::<LogLevel>().unwrap(), level);
    }

    #[test]
    fn test_at_least_mask_matches_ordering(threshold in any_level(), level in any_level()) {
        prop_assert_eq!(LevelMask::at_least(threshold).contains(level), level >= threshold);
    }

    /// Gating: a record reaches the output iff it passes both thresholds
    #[test]
    fn test_dual_threshold_gating(
        instance in any_level(),
        shared in any_level(),
        level in prop_oneof![
            Just(LogLevel::Trace),
            Just(LogLevel::Debug),
            Just(LogLevel::Info),
            Just(LogLevel::Warn),
            Just(LogLevel::Error),
        ],
    ) {
        let config = Arc::new(LoggerConfig::with_exit_handler(Arc::new(|_| {})));
        config.set_level(shared);
        let memory = MemoryAppender::new();
        let logger = Logger::builder()
            .config(config)
            .min_level(instance)
            .appender(memory.clone())
            .build();

        logger.log(level, "gated");
        prop_assert_eq!(memory.len() == 1, level >= instance && level >= shared);
    }
}
