//! Inline cache transparency and soundness
//!
//! A cached access must return exactly what the general path returns, and
//! must never serve a value out of a store the object no longer owns.

use core_types::{Attributes, PropertyKey, Strictness};
use inline_cache::{KnownTypeBox, ShapeSlot, UnknownTypeBox};
use integration_tests::init_tracing;
use object_model::{Descriptor, ObjectRef, StoreKind, Value};
use proptest::prelude::*;

fn numbers(n: i32) -> ObjectRef {
    ObjectRef::array((0..n).map(Value::Smi).collect(), None)
}

#[test]
fn test_shape_slot_learned_on_one_object_hits_its_shape_twin() {
    init_tracing();
    let build = |x: i32, y: i32| {
        let obj = ObjectRef::ordinary(None);
        obj.try_set_property(PropertyKey::from_name("twin_x"), Value::Smi(x)).unwrap();
        obj.try_set_property(PropertyKey::from_name("twin_y"), Value::Smi(y)).unwrap();
        obj
    };
    let first = build(1, 2);
    let second = build(10, 20);
    assert_eq!(first.shape().unwrap().id(), second.shape().unwrap().id());

    let mut site = ShapeSlot::new(PropertyKey::from_name("twin_y"));
    assert_eq!(site.get(&first), Ok(Value::Smi(2)));
    assert_eq!(site.stats().fast_hits(), 0);
    assert_eq!(site.stats().fallbacks(), 1);

    assert_eq!(site.get(&second), Ok(Value::Smi(20)));
    assert_eq!(site.stats().fast_hits(), 1);
    assert_eq!(site.stats().fallbacks(), 1);

    assert_eq!(site.set(&second, Value::Smi(21), Strictness::Strict), Ok(true));
    assert_eq!(site.stats().fast_hits(), 2);
    assert_eq!(second.get(&PropertyKey::from_name("twin_y")), Ok(Value::Smi(21)));
    assert_eq!(first.get(&PropertyKey::from_name("twin_y")), Ok(Value::Smi(2)));
}

#[test]
fn test_box_sound_after_array_becomes_dictionary() {
    init_tracing();
    let array = numbers(4);
    let boxed = KnownTypeBox::new(array.clone(), StoreKind::Array);
    assert_eq!(boxed.get(&Value::Smi(1)), Ok(Value::Smi(1)));
    assert_eq!(boxed.stats().fast_hits(), 1);

    let getter = object_model::JsFunction::new("computed", 0, |_, _| Ok(Value::string("computed")));
    array
        .define_own_property(Descriptor::accessor(PropertyKey::Index(1), Some(getter), None, Attributes::default()))
        .unwrap();
    assert_eq!(array.store_kind(), StoreKind::Dictionary);
    assert!(!boxed.is_fast());

    assert_eq!(boxed.get(&Value::Smi(1)), Ok(Value::string("computed")));
    assert_eq!(boxed.get(&Value::Smi(2)), Ok(Value::Smi(2)));
    assert_eq!(boxed.stats().fast_hits(), 1);
    assert_eq!(boxed.stats().fallbacks(), 2);

    assert_eq!(boxed.set(&Value::Smi(2), Value::Smi(20), Strictness::Strict), Ok(true));
    assert_eq!(array.get(&PropertyKey::Index(2)), Ok(Value::Smi(20)));
}

#[test]
fn test_box_sound_after_sparse_write() {
    let array = numbers(3);
    let boxed = UnknownTypeBox::new(Value::Object(array.clone()), StoreKind::Array);
    assert!(boxed.is_fast());

    array.try_set_property(PropertyKey::Index(50_000), Value::Null).unwrap();
    assert!(!boxed.is_fast());
    assert_eq!(boxed.get(&Value::Smi(0)), Ok(Value::Smi(0)));
    assert_eq!(boxed.get(&Value::Double(50_000.0)), Ok(Value::Null));
    assert_eq!(boxed.stats().fast_hits(), 0);
}

#[test]
fn test_numeric_key_boundary() {
    let array = numbers(5);
    array.try_set_property(PropertyKey::from_name("3.5"), Value::string("half")).unwrap();
    array.try_set_property(PropertyKey::from_name("-1"), Value::string("minus")).unwrap();
    let boxed = KnownTypeBox::new(array, StoreKind::Array);

    assert_eq!(boxed.get(&Value::Double(3.0)), Ok(Value::Smi(3)));
    assert_eq!(boxed.stats().fast_hits(), 1);

    assert_eq!(boxed.get(&Value::Double(3.5)), Ok(Value::string("half")));
    assert_eq!(boxed.get(&Value::Smi(-1)), Ok(Value::string("minus")));
    assert_eq!(boxed.get(&Value::Double(-0.0)), Ok(Value::Smi(0)));
    assert_eq!(boxed.stats().fallbacks(), 2);
}

#[test]
fn test_shape_slot_sound_after_dictionary_unshapes() {
    let obj = ObjectRef::ordinary(None);
    for i in 0..12 {
        obj.try_set_property(PropertyKey::from_name(&format!("u{}", i)), Value::Smi(i)).unwrap();
    }
    let mut site = ShapeSlot::new(PropertyKey::from_name("u11"));
    site.get(&obj).unwrap();
    assert_eq!(site.get(&obj), Ok(Value::Smi(11)));
    assert_eq!(site.stats().fast_hits(), 1);

    for i in 0..10 {
        obj.delete(&PropertyKey::from_name(&format!("u{}", i)));
    }
    assert!(obj.shape().is_none());
    obj.try_set_property(PropertyKey::from_name("u11"), Value::Smi(-11)).unwrap();
    assert_eq!(site.get(&obj), Ok(Value::Smi(-11)));
    assert_eq!(site.set(&obj, Value::Smi(0), Strictness::Strict), Ok(true));
    assert_eq!(obj.get(&PropertyKey::from_name("u11")), Ok(Value::Smi(0)));
    assert_eq!(site.stats().fast_hits(), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Set(u8, i32),
    Delete(u8),
    Get(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6, any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        (0u8..6).prop_map(Op::Delete),
        (0u8..6).prop_map(Op::Get),
    ]
}

proptest! {
    #[test]
    fn prop_shape_slot_matches_general_path(ops in prop::collection::vec(op(), 1..64)) {
        let cached = ObjectRef::ordinary(None);
        let plain = ObjectRef::ordinary(None);
        let mut sites: Vec<ShapeSlot> = (0..6)
            .map(|k| ShapeSlot::new(PropertyKey::from_name(&format!("t{}", k))))
            .collect();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    let via_cache = sites[k as usize].set(&cached, Value::Smi(v), Strictness::Sloppy);
                    let direct = plain.put(PropertyKey::from_name(&format!("t{}", k)), Value::Smi(v), Strictness::Sloppy);
                    prop_assert_eq!(via_cache, direct);
                }
                Op::Delete(k) => {
                    let key = PropertyKey::from_name(&format!("t{}", k));
                    prop_assert_eq!(cached.delete(&key), plain.delete(&key));
                }
                Op::Get(k) => {
                    let via_cache = sites[k as usize].get(&cached);
                    let direct = plain.get(&PropertyKey::from_name(&format!("t{}", k)));
                    prop_assert_eq!(via_cache, direct);
                }
            }
        }
        prop_assert_eq!(cached.keys(), plain.keys());
    }

    #[test]
    fn prop_box_matches_general_path(len in 0i32..80, reads in prop::collection::vec(-4.0f64..100.0, 1..32)) {
        let array = numbers(len);
        let boxed = KnownTypeBox::new(array.clone(), StoreKind::Array);
        for raw in reads {
            let key = Value::Double(raw.floor());
            prop_assert_eq!(boxed.get(&key), array.get(&key.to_property_key()));
        }
    }
}
