//! Unit tests for PropertyKey canonicalisation

use core_types::{index_from_f64, PropertyKey};
use proptest::prelude::*;

#[test]
fn test_name_and_number_agree_on_indices() {
    assert_eq!(PropertyKey::from_name("3"), PropertyKey::from_number(3.0));
    assert_eq!(PropertyKey::from_name("0"), PropertyKey::from_number(-0.0));
}

#[test]
fn test_non_index_numbers_become_names() {
    assert_eq!(PropertyKey::from_number(3.5).as_str(), Some("3.5"));
    assert_eq!(PropertyKey::from_number(-1.0).as_str(), Some("-1"));
    assert_eq!(PropertyKey::from_number(f64::NAN).as_str(), Some("NaN"));
}

#[test]
fn test_key_display() {
    assert_eq!(PropertyKey::from_name("abc").to_string(), "abc");
    assert_eq!(PropertyKey::Index(12).to_string(), "12");
}

#[test]
fn test_keys_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PropertyKey>();
}

proptest! {
    #[test]
    fn prop_index_round_trips_through_name(i in 0u32..u32::MAX) {
        let key = PropertyKey::from_name(&i.to_string());
        prop_assert_eq!(key, PropertyKey::Index(i));
    }

    #[test]
    fn prop_fractional_numbers_never_index(n in -1.0e9f64..1.0e9f64) {
        prop_assume!(n.fract() != 0.0);
        prop_assert_eq!(index_from_f64(n), None);
        prop_assert!(!PropertyKey::from_number(n).is_index());
    }
}
