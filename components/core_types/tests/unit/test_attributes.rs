//! Unit tests for Attributes and Strictness

use core_types::{Attributes, Strictness};

#[test]
fn test_attribute_combinations() {
    let attrs = Attributes::ENUMERABLE | Attributes::CONFIGURABLE;
    assert!(!attrs.is_writable());
    assert!(attrs.is_enumerable());
    assert!(attrs.is_configurable());
}

#[test]
fn test_removing_writable() {
    let attrs = Attributes::default() - Attributes::WRITABLE;
    assert!(!attrs.is_writable());
    assert_ne!(attrs, Attributes::default());
}

#[test]
fn test_strictness_default_is_sloppy() {
    assert_eq!(Strictness::default(), Strictness::Sloppy);
    assert!(!Strictness::default().is_strict());
    assert_eq!(Strictness::Sloppy.reject("ignored"), Ok(false));
}
