//! End-to-End Object Model Tests
//!
//! Drives objects through the public property-access contract and checks the
//! combined effect of shapes, stores and descriptors:
//! - Property lifecycle (define, delete, re-add)
//! - Store strategy changes under heavy mutation
//! - Prototype chains with accessors
//! - Exotic objects (arguments, functions)

use std::cell::RefCell;
use std::rc::Rc;

use core_types::{Attributes, PropertyKey, Strictness};
use integration_tests::init_tracing;
use object_model::{Descriptor, JsFunction, ObjectRef, StoreKind, StorePolicy, Value};

fn key(name: &str) -> PropertyKey {
    PropertyKey::from_name(name)
}

#[test]
fn test_delete_and_redefine_scenario() {
    init_tracing();
    let obj = ObjectRef::ordinary(None);
    obj.try_set_property(key("a"), Value::Smi(1)).unwrap();
    obj.try_set_property(key("b"), Value::Smi(2)).unwrap();
    obj.try_set_property(key("c"), Value::Smi(3)).unwrap();

    assert!(obj.delete(&key("b")));
    assert_eq!(obj.keys(), vec![key("a"), key("c")]);
    assert_eq!(obj.try_get_property(&key("b")), Ok(None));
    assert!(!obj.has_own_property(&key("b")));

    obj.try_set_property(key("b"), Value::Smi(4)).unwrap();
    assert_eq!(obj.keys(), vec![key("a"), key("c"), key("b")]);
    assert_eq!(obj.try_get_property(&key("b")), Ok(Some(Value::Smi(4))));
}

#[test]
fn test_heavy_deletion_keeps_semantics() {
    init_tracing();
    let policy = StorePolicy {
        deletion_threshold: 4,
        ..StorePolicy::default()
    };
    let obj = ObjectRef::with_policy(None, policy);
    for i in 0..10 {
        obj.try_set_property(key(&format!("p{}", i)), Value::Smi(i)).unwrap();
    }
    let shaped_id = obj.store_id();
    for i in (0..10).step_by(2) {
        assert!(obj.delete(&key(&format!("p{}", i))));
    }

    assert_ne!(obj.store_id(), shaped_id);
    assert!(obj.shape().is_none());
    assert_eq!(
        obj.keys(),
        vec![key("p1"), key("p3"), key("p5"), key("p7"), key("p9")]
    );
    for i in (1..10).step_by(2) {
        assert_eq!(obj.get(&key(&format!("p{}", i))), Ok(Value::Smi(i)));
    }
    obj.try_set_property(key("p0"), Value::Smi(100)).unwrap();
    assert_eq!(obj.keys().last(), Some(&key("p0")));
}

#[test]
fn test_array_grows_then_converts() {
    init_tracing();
    let array = ObjectRef::array(Vec::new(), None);
    for i in 0..100 {
        array.try_set_property(PropertyKey::Index(i), Value::Smi(i as i32)).unwrap();
    }
    assert_eq!(array.store_kind(), StoreKind::Array);

    array.try_set_property(PropertyKey::Index(1_000_000), Value::Smi(-1)).unwrap();
    assert_eq!(array.store_kind(), StoreKind::Dictionary);
    assert_eq!(array.keys().len(), 101);
    assert_eq!(array.get(&PropertyKey::Index(99)), Ok(Value::Smi(99)));
    assert_eq!(array.get(&PropertyKey::Index(1_000_000)), Ok(Value::Smi(-1)));
}

#[test]
fn test_prototype_getter_sees_receiver() {
    let proto = ObjectRef::ordinary(None);
    let getter = JsFunction::new("describe", 0, |this, _| {
        this.get_property(&PropertyKey::from("label"))
    });
    proto
        .define_own_property(Descriptor::accessor(key("description"), Some(getter), None, Attributes::default()))
        .unwrap();

    let first = ObjectRef::ordinary(Some(proto.clone()));
    first.try_set_property(key("label"), Value::string("first")).unwrap();
    let second = ObjectRef::ordinary(Some(proto));
    second.try_set_property(key("label"), Value::string("second")).unwrap();

    assert_eq!(first.get(&key("description")), Ok(Value::string("first")));
    assert_eq!(second.get(&key("description")), Ok(Value::string("second")));
}

#[test]
fn test_frozen_style_object() {
    let obj = ObjectRef::ordinary(None);
    obj.try_set_property(key("x"), Value::Smi(1)).unwrap();
    obj.define_own_property(Descriptor::value(key("x"), Value::Smi(1), Attributes::ENUMERABLE))
        .unwrap();
    obj.prevent_extensions();

    assert!(obj.put(key("x"), Value::Smi(2), Strictness::Strict).is_err());
    assert!(obj.put(key("y"), Value::Smi(2), Strictness::Strict).is_err());
    assert!(!obj.delete(&key("x")));
    assert_eq!(obj.keys(), vec![key("x")]);
}

#[test]
fn test_arguments_alias_both_ways() {
    let parameters = Rc::new(RefCell::new(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]));
    let args = ObjectRef::arguments(parameters.clone(), None);

    parameters.borrow_mut()[2] = Value::Smi(30);
    assert_eq!(args.get(&PropertyKey::Index(2)), Ok(Value::Smi(30)));

    args.try_set_property(PropertyKey::Index(1), Value::Smi(20)).unwrap();
    assert_eq!(parameters.borrow()[1], Value::Smi(20));

    assert!(args.delete(&PropertyKey::Index(0)));
    args.try_set_property(PropertyKey::Index(0), Value::Smi(100)).unwrap();
    assert_eq!(parameters.borrow()[0], Value::Smi(1));
    assert_eq!(args.get(&PropertyKey::Index(0)), Ok(Value::Smi(100)));
}

#[test]
fn test_function_object_properties() {
    let f = JsFunction::new("sum", 3, |_, args| {
        let total = args.iter().filter_map(Value::as_number).sum::<f64>();
        Ok(Value::Double(total))
    });
    let obj = ObjectRef::function(f, None);
    assert_eq!(obj.get(&key("name")), Ok(Value::string("sum")));
    assert_eq!(obj.get(&key("length")), Ok(Value::Smi(3)));
    assert_eq!(obj.keys(), vec![key("length"), key("name")]);

    obj.define_own_property(Descriptor::value(key("name"), Value::string("total"), Attributes::hidden()))
        .unwrap();
    assert_eq!(obj.get(&key("name")), Ok(Value::string("total")));
    assert!(obj.put(key("name"), Value::string("again"), Strictness::Strict).unwrap());
}
