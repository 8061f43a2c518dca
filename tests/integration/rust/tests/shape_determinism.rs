//! Shape determinism
//!
//! Replaying the same sequence of additions from the root must resolve every
//! key to the same slot and attributes, whether or not the shapes involved
//! were flattened in between.

use core_types::{Attributes, PropertyKey};
use object_model::{Descriptor, ObjectRef, Shape, Value};
use proptest::prelude::*;

fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    (0u8..8).prop_map(Attributes::from_bits_truncate)
}

fn additions() -> impl Strategy<Value = Vec<(String, Attributes)>> {
    prop::collection::vec(("[a-e]{1,2}", attributes_strategy()), 1..24)
}

fn replay(steps: &[(String, Attributes)]) -> std::sync::Arc<Shape> {
    let mut shape = Shape::root();
    for (name, attributes) in steps {
        let key = PropertyKey::from_name(name);
        shape = match shape.lookup(&key) {
            Some(info) if info.attributes == *attributes => shape,
            Some(_) => shape.reconfigure_property(key, *attributes),
            None => shape.add_property(key, *attributes),
        };
    }
    shape
}

proptest! {
    #[test]
    fn prop_replay_resolves_identically(steps in additions()) {
        let first = replay(&steps);
        let second = replay(&steps);

        for (name, _) in &steps {
            let key = PropertyKey::from_name(name);
            prop_assert_eq!(first.lookup(&key), second.lookup(&key));
        }
        prop_assert_eq!(first.own_keys(), second.own_keys());
        prop_assert_eq!(first.id(), second.id());
    }

    #[test]
    fn prop_flatten_preserves_lookup(steps in additions()) {
        let shape = replay(&steps);
        let keys = shape.own_keys();
        let before: Vec<_> = keys.iter().map(|k| shape.lookup(k)).collect();

        shape.flatten_with_ancestors();
        prop_assert!(shape.is_flattened());
        let after: Vec<_> = keys.iter().map(|k| shape.lookup(k)).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(shape.own_keys(), keys);
    }

    #[test]
    fn prop_objects_built_alike_share_shapes(names in prop::collection::vec("[f-j]{1,3}", 1..12)) {
        let build = || {
            let obj = ObjectRef::ordinary(None);
            for name in &names {
                let desc = Descriptor::value(PropertyKey::from_name(name), Value::Null, Attributes::default());
                obj.define_own_property(desc).unwrap();
            }
            obj
        };
        let a = build();
        let b = build();
        prop_assert_eq!(a.shape().map(|s| s.id()), b.shape().map(|s| s.id()));
        prop_assert_eq!(a.keys(), b.keys());
    }
}
