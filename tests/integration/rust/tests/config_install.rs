//! Installed configuration
//!
//! Runs as its own test binary: installing a store policy changes every
//! object created afterwards in the process.

use core_types::PropertyKey;
use integration_tests::init_tracing;
use object_model::{ObjectModelConfig, ObjectRef, StoreKind, StorePolicy, Value};

fn key(name: &str) -> PropertyKey {
    PropertyKey::from_name(name)
}

fn filled(names: &[&str]) -> ObjectRef {
    let obj = ObjectRef::ordinary(None);
    for (i, name) in names.iter().enumerate() {
        obj.try_set_property(key(name), Value::Smi(i as i32)).unwrap();
    }
    obj
}

#[test]
fn test_installed_store_policy_reaches_new_objects() {
    init_tracing();
    let before = filled(&["a", "b", "c", "d"]);

    let config = ObjectModelConfig::from_json(
        r#"{ "store": { "deletion_threshold": 2, "array_min_fill_ratio": 0.5, "array_sparse_min_len": 4 } }"#,
    )
    .unwrap();
    config.install();
    assert_eq!(StorePolicy::installed(), config.store);

    // Two deletions cross a threshold of two.
    let after = filled(&["a", "b", "c", "d"]);
    assert_eq!(after.policy().deletion_threshold, 2);
    assert!(after.delete(&key("a")));
    assert!(after.shape().is_some());
    assert!(after.delete(&key("b")));
    assert!(after.shape().is_none());
    assert_eq!(after.keys(), vec![key("c"), key("d")]);
    assert_eq!(after.get(&key("d")), Ok(Value::Smi(3)));

    // Objects created earlier keep their own policy.
    assert!(before.delete(&key("a")));
    assert!(before.delete(&key("b")));
    assert!(before.shape().is_some());

    // Array sparsity follows the installed ratio.
    let array = ObjectRef::array((0..6).map(Value::Smi).collect(), None);
    for i in 0..3 {
        assert!(array.delete(&PropertyKey::Index(i)));
    }
    assert_eq!(array.store_kind(), StoreKind::Array);
    assert!(array.delete(&PropertyKey::Index(3)));
    assert_eq!(array.store_kind(), StoreKind::Dictionary);
    assert_eq!(array.keys(), vec![PropertyKey::Index(4), PropertyKey::Index(5)]);

    ObjectModelConfig::default().install();
    assert_eq!(StorePolicy::installed(), StorePolicy::default());
}
