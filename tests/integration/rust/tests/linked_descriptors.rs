//! Linked descriptors
//!
//! A link built over another link points straight at the final source, so a
//! chain of any length costs one hop on access.

use core_types::{Attributes, ErrorKind, PropertyKey, Strictness};
use object_model::{ConstructionError, Descriptor, DescriptorKind, ObjectRef, Value};

fn key(name: &str) -> PropertyKey {
    PropertyKey::from_name(name)
}

fn link_target(obj: &ObjectRef, name: &str) -> (ObjectRef, PropertyKey) {
    match obj.get_own_descriptor(&key(name)).map(|d| d.kind) {
        Some(DescriptorKind::Linked(link)) => (link.target().clone(), link.key().clone()),
        other => panic!("expected a linked property, got {:?}", other),
    }
}

#[test]
fn test_chains_collapse_for_any_length() {
    for n in 1..=16 {
        let source = ObjectRef::ordinary(None);
        source.try_set_property(key("origin"), Value::Smi(n)).unwrap();

        let mut previous = (source.clone(), key("origin"));
        let mut views = Vec::new();
        for _ in 0..n {
            let view = ObjectRef::ordinary(None);
            let desc = Descriptor::linked(key("alias"), &previous.0, previous.1.clone(), Attributes::default())
                .unwrap();
            view.define_own_property(desc).unwrap();
            previous = (view.clone(), key("alias"));
            views.push(view);
        }

        let last = views.last().unwrap();
        let (target, target_key) = link_target(last, "alias");
        assert!(target.ptr_eq(&source), "chain of {} did not collapse", n);
        assert_eq!(target_key, key("origin"));
        assert_eq!(last.get(&key("alias")), Ok(Value::Smi(n)));

        last.set_property(key("alias"), Value::Smi(-n), Strictness::Strict).unwrap();
        assert_eq!(source.get(&key("origin")), Ok(Value::Smi(-n)));
        for view in &views {
            assert_eq!(view.get(&key("alias")), Ok(Value::Smi(-n)));
        }
    }
}

#[test]
fn test_link_to_missing_property_fails_fast() {
    let source = ObjectRef::ordinary(None);
    let err = Descriptor::linked(key("alias"), &source, key("nothing"), Attributes::default()).unwrap_err();
    assert_eq!(err, ConstructionError::MissingLinkSource(key("nothing")));
}

#[test]
fn test_link_respects_source_writability() {
    let source = ObjectRef::ordinary(None);
    source
        .define_own_property(Descriptor::value(key("constant"), Value::Smi(1), Attributes::ENUMERABLE))
        .unwrap();
    let view = ObjectRef::ordinary(None);
    view.define_own_property(
        Descriptor::linked(key("constant"), &source, key("constant"), Attributes::default()).unwrap(),
    )
    .unwrap();

    assert_eq!(view.try_set_property(key("constant"), Value::Smi(2)), Ok(false));
    assert!(view
        .set_property(key("constant"), Value::Smi(2), Strictness::Strict)
        .is_err());
    assert_eq!(view.get(&key("constant")), Ok(Value::Smi(1)));
}

#[test]
fn test_link_into_array_element() {
    let array = ObjectRef::array(vec![Value::Smi(7), Value::Smi(8)], None);
    let view = ObjectRef::ordinary(None);
    view.define_own_property(
        Descriptor::linked(key("second"), &array, PropertyKey::Index(1), Attributes::default()).unwrap(),
    )
    .unwrap();
    assert_eq!(view.get(&key("second")), Ok(Value::Smi(8)));
    view.try_set_property(key("second"), Value::Smi(80)).unwrap();
    assert_eq!(array.get(&PropertyKey::Index(1)), Ok(Value::Smi(80)));
}

#[test]
fn test_self_link_is_rejected() {
    let obj = ObjectRef::ordinary(None);
    obj.try_set_property(key("x"), Value::Smi(1)).unwrap();
    let self_link = Descriptor::linked(key("x"), &obj, key("x"), Attributes::default()).unwrap();

    assert!(!obj.try_define_own_property(self_link.clone()));
    assert!(obj.define_own_property(self_link).is_err());
    assert_eq!(obj.get(&key("x")), Ok(Value::Smi(1)));
    assert!(obj.get_own_descriptor(&key("x")).unwrap().kind.is_data());
}

#[test]
fn test_mutual_links_are_rejected() {
    let first = ObjectRef::ordinary(None);
    let second = ObjectRef::ordinary(None);
    first.try_set_property(key("a"), Value::Smi(1)).unwrap();
    second
        .define_own_property(Descriptor::linked(key("b"), &first, key("a"), Attributes::default()).unwrap())
        .unwrap();

    // Collapses to first.a, i.e. a link from first.a to itself.
    let back = Descriptor::linked(key("a"), &second, key("b"), Attributes::default()).unwrap();
    assert!(!first.try_define_own_property(back));
    assert_eq!(second.get(&key("b")), Ok(Value::Smi(1)));
}

#[test]
fn test_source_replaced_by_link_raises_type_error() {
    let origin = ObjectRef::ordinary(None);
    origin.try_set_property(key("z"), Value::Smi(3)).unwrap();
    let middle = ObjectRef::ordinary(None);
    middle.try_set_property(key("y"), Value::Smi(2)).unwrap();
    let view = ObjectRef::ordinary(None);
    view.define_own_property(Descriptor::linked(key("v"), &middle, key("y"), Attributes::default()).unwrap())
        .unwrap();

    middle
        .define_own_property(Descriptor::linked(key("y"), &origin, key("z"), Attributes::default()).unwrap())
        .unwrap();

    assert_eq!(view.get(&key("v")).unwrap_err().kind, ErrorKind::TypeError);
    assert_eq!(
        view.try_set_property(key("v"), Value::Smi(9)).unwrap_err().kind,
        ErrorKind::TypeError
    );
    assert_eq!(origin.get(&key("z")), Ok(Value::Smi(3)));

    // Linking `view.v` again collapses through middle.y onto origin.z.
    view.define_own_property(Descriptor::linked(key("v"), &middle, key("y"), Attributes::default()).unwrap())
        .unwrap();
    assert_eq!(view.get(&key("v")), Ok(Value::Smi(3)));
}

#[test]
fn test_write_through_deleted_source_is_rejected() {
    let source = ObjectRef::ordinary(None);
    source.try_set_property(key("gone"), Value::Smi(1)).unwrap();
    let view = ObjectRef::ordinary(None);
    view.define_own_property(Descriptor::linked(key("alias"), &source, key("gone"), Attributes::default()).unwrap())
        .unwrap();

    assert!(source.delete(&key("gone")));
    assert_eq!(view.get(&key("alias")), Ok(Value::Undefined));
    assert_eq!(view.try_set_property(key("alias"), Value::Smi(2)), Ok(false));
    assert_eq!(
        view.set_property(key("alias"), Value::Smi(2), Strictness::Strict)
            .unwrap_err()
            .kind,
        ErrorKind::TypeError
    );
    assert!(!source.has_own_property(&key("gone")));
}
