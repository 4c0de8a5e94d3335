//! Property-based test generators using proptest.

use proptest::prelude::*;
use std::collections::HashMap;

/// One call to `update`: a key and either a value or a tombstone.
pub type Update = (String, Option<u64>);

/// Strategy for keys drawn from a small alphabet, so sequences revisit keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e]{1,2}").expect("Invalid regex")
}

/// Strategy for a single update; roughly one in four is a tombstone.
pub fn update_strategy() -> impl Strategy<Value = Update> {
    (
        key_strategy(),
        prop_oneof![3 => any::<u64>().prop_map(Some), 1 => Just(None)],
    )
}

/// Strategy for a sequence of up to `max_len` updates.
pub fn update_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<Update>> {
    prop::collection::vec(update_strategy(), 0..=max_len)
}

/// Folds updates the way replay does: later wins, `None` deletes.
pub fn fold_updates<'a>(updates: impl IntoIterator<Item = &'a Update>) -> HashMap<String, u64> {
    let mut map = HashMap::new();
    for (key, value) in updates {
        match value {
            Some(value) => {
                map.insert(key.clone(), *value);
            }
            None => {
                map.remove(key);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_applies_tombstones() {
        let updates = vec![
            ("a".to_string(), Some(1)),
            ("b".to_string(), Some(2)),
            ("a".to_string(), None),
        ];
        let map = fold_updates(&updates);
        assert_eq!(map.len(), 1);
        assert_eq!(map["b"], 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn keys_are_short(key in key_strategy()) {
            prop_assert!(!key.is_empty() && key.len() <= 2);
        }

        #[test]
        fn sequences_respect_bound(updates in update_sequence_strategy(10)) {
            prop_assert!(updates.len() <= 10);
        }
    }
}
