use std::sync::Once;

use tyreg::{FieldRef, MetaData, TypeKind, TypeRegistry, prelude::*};
use tyreg_testhelpers::test;

#[derive(Debug, Default, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn get_x(&self) -> i32 {
        self.x
    }

    fn set_x(&mut self, x: i32) {
        self.x = x;
    }
}

fn register() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        reflect::<Point>("Point")
            .property("x", field!(Point, x))
            .property("y", field!(Point, y))
            .function("get_x", Point::get_x)
            .function("set_x", Point::set_x)
            .constructor();
    });
}

#[test]
fn primitives_are_known_from_the_start() {
    let int = type_of::<i32>();
    assert!(int.valid());
    assert_eq!(int.name(), "i32");
    assert_eq!(int.size(), 4);
    assert_eq!(int.kind(), TypeKind::Scalar);

    assert!(core::ptr::eq(type_named("String"), type_of::<String>()));
    assert!(core::ptr::eq(type_named("f64"), type_of::<f64>()));
    assert!(core::ptr::eq(type_named("&str"), type_of::<&'static str>()));
    assert!(core::ptr::eq(type_named("char"), type_of::<char>()));
}

#[test(register)]
fn struct_registration_records_layout_and_properties() {
    let meta = type_of::<Point>();
    assert!(meta.valid());
    assert_eq!(meta.name(), "Point");
    assert_eq!(meta.size(), size_of::<Point>());
    assert_eq!(meta.align(), align_of::<Point>());
    assert_eq!(meta.kind(), TypeKind::Aggregate);
    assert!(core::ptr::eq(type_named("Point"), meta));
    assert_eq!(meta.type_id(), Some(core::any::TypeId::of::<Point>()));
    assert!(meta.is::<Point>());
    assert_eq!(MetaData::unregistered().type_id(), None);

    let names: Vec<_> = meta.properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, ["x", "y"]);

    let y = meta.property("y").unwrap();
    assert_eq!(y.offset(), core::mem::offset_of!(Point, y));
    assert!(core::ptr::eq(y.element_type(), type_of::<i32>()));
}

#[test(register)]
fn member_functions_are_listed_in_order() {
    let meta = type_of::<Point>();
    let names: Vec<_> = meta.functions().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["get_x", "set_x"]);
    assert!(meta.function("get_x").is_some());
    assert!(meta.function("get_z").is_none());
}

#[test]
fn unknown_names_give_the_invalid_record() {
    let meta = type_named("NoSuchType");
    assert!(!meta.valid());
    assert_eq!(meta.name(), "Unregistered");
    assert_eq!(meta.size(), 0);
    assert!(meta.property("x").is_none());
    assert!(core::ptr::eq(meta, MetaData::unregistered()));
    assert!(function_named("no_such_function").is_none());
}

#[test]
fn unregistered_types_get_a_stable_invalid_record() {
    struct Hidden {
        _value: u32,
    }

    let first = type_of::<Hidden>();
    assert!(!first.valid());
    assert_eq!(first.name(), "Unregistered");
    assert_eq!(first.size(), 0);
    assert!(first.properties().is_empty());
    assert!(core::ptr::eq(first, type_of::<Hidden>()));

    // looking a type up never gives it a name
    assert!(!type_named("Unregistered").valid());
}

#[test]
fn properties_can_name_types_registered_later() {
    struct Inner {
        _value: u8,
    }
    struct Outer {
        inner: Inner,
    }

    reflect::<Outer>("Outer").property("inner", field!(Outer, inner));
    let element = type_of::<Outer>().property("inner").unwrap().element_type();
    assert!(!element.valid());

    reflect::<Inner>("Inner");
    assert!(element.valid());
    assert_eq!(element.name(), "Inner");
    assert!(core::ptr::eq(element, type_of::<Inner>()));
}

#[test]
fn registering_twice_keeps_both_names() {
    struct Renamed;

    reflect::<Renamed>("OldName");
    reflect::<Renamed>("NewName");

    let meta = type_of::<Renamed>();
    assert_eq!(meta.name(), "NewName");
    assert!(core::ptr::eq(type_named("OldName"), meta));
    assert!(core::ptr::eq(type_named("NewName"), meta));
}

#[test]
fn zero_sized_types_are_valid() {
    struct Tag;

    reflect::<Tag>("Tag");
    let meta = type_of::<Tag>();
    assert!(meta.valid());
    assert_eq!(meta.size(), 0);
}

#[test(register)]
fn names_lists_registered_types() {
    let names: Vec<_> = TypeRegistry::global()
        .names()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert!(names.contains(&"Point"));
    assert!(names.contains(&"u128"));
    assert!(names.is_sorted());
}

#[test]
#[should_panic(expected = "does not fit")]
fn out_of_bounds_properties_are_rejected() {
    struct Small {
        _value: u8,
    }

    fn never(_: &Small) -> &u64 {
        unreachable!()
    }

    // SAFETY: the builder rejects the offset before anything reads through it
    let bogus = unsafe { FieldRef::<Small, u64>::new(0, never) };
    reflect::<Small>("Small").property("value", bogus);
}
