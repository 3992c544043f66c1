use std::sync::Once;

use tyreg::{ReflectError, prelude::*};
use tyreg_testhelpers::test;

#[derive(Debug, Default, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Named {
    name: String,
    origin: Point,
}

fn register() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        reflect::<Point>("Point")
            .property("x", field!(Point, x))
            .property("y", field!(Point, y));
        reflect::<Named>("Named")
            .property("name", field!(Named, name))
            .property("origin", field!(Named, origin));
    });
}

#[test]
fn default_handle_is_invalid() {
    let var = VarPtr::default();
    assert!(!var.valid());
    assert!(!var.type_info().valid());
    assert_eq!(var.type_info().name(), "Unregistered");
    assert!(var.data().is_null());
}

#[test]
fn handles_agree_however_the_value_is_reached() {
    let mut value = 42i32;
    let address = &value as *const i32;

    let from_stack = VarPtr::new(&mut value);
    assert_eq!(from_stack.type_info().name(), "i32");
    assert_eq!(from_stack.data().as_ptr::<i32>(), address);
    let stack_type = from_stack.type_info();
    drop(from_stack);

    let reference = &mut value;
    let from_reference = VarPtr::new(reference);
    assert!(core::ptr::eq(from_reference.type_info(), stack_type));
    assert_eq!(from_reference.as_ptr::<i32>(), address);
    drop(from_reference);

    let from_raw = unsafe { VarPtr::from_raw(&mut value as *mut i32) };
    assert!(core::ptr::eq(from_raw.type_info(), stack_type));
    assert_eq!(*from_raw.get::<i32>(), 42);
    drop(from_raw);

    let read_only = VarPtr::from_ref(&value);
    assert!(core::ptr::eq(read_only.type_info(), stack_type));
    assert!(!read_only.is_mutable());
    assert_eq!(read_only.value::<i32>(), 42);
}

#[test]
fn boxed_values_are_reached_through_the_box() {
    let mut boxed = Box::new(7u64);
    let address = &*boxed as *const u64;
    let mut var = VarPtr::new(&mut *boxed);
    assert_eq!(var.as_ptr::<u64>(), address);
    *var.get_mut::<u64>() += 1;
    assert_eq!(*boxed, 8);
}

#[test]
fn extraction_by_reference_value_and_pointer() {
    let mut value = 10i32;
    let mut var = VarPtr::new(&mut value);

    assert_eq!(*var.get::<i32>(), 10);
    assert_eq!(var.value::<i32>(), 10);
    *var.get_mut::<i32>() = 11;
    unsafe { *var.as_mut_ptr::<i32>() += 1 };
    assert_eq!(var.value::<i32>(), 12);
    assert_eq!(value, 12);
}

#[test]
fn conversions_from_references() {
    let mut value = String::from("hello");
    let var: VarPtr<'_> = (&mut value).into();
    assert!(var.is_mutable());
    assert_eq!(var.get::<String>(), "hello");
    drop(var);

    let var: VarPtr<'_> = (&value).into();
    assert!(!var.is_mutable());
}

#[test]
#[should_panic(expected = "Wrong type")]
fn extracting_the_wrong_type_panics() {
    let mut value = 1u8;
    let var = VarPtr::new(&mut value);
    let _ = var.get::<i8>();
}

#[test]
#[should_panic(expected = "read-only")]
fn mutating_through_a_read_only_handle_panics() {
    let value = 1u8;
    let mut var = VarPtr::from_ref(&value);
    *var.get_mut::<u8>() = 2;
}

#[test]
#[should_panic(expected = "is not registered")]
fn unregistered_values_cannot_be_wrapped() {
    struct Stranger;
    let mut stranger = Stranger;
    let _ = VarPtr::new(&mut stranger);
}

#[test]
fn try_variants_report_errors() {
    let mut value = 1u8;
    let mut var = VarPtr::new(&mut value);
    assert_eq!(
        var.try_get::<u16>().unwrap_err(),
        ReflectError::WrongType {
            requested: "u16",
            actual: "u8"
        }
    );
    assert!(var.try_get_mut::<u8>().is_ok());

    let invalid = VarPtr::default();
    assert!(invalid.try_get::<u8>().is_err());
}

#[test(register)]
fn properties_read_and_write_fields() {
    let mut point = Point { x: 1, y: 2 };
    let mut var = VarPtr::new(&mut point);

    assert_eq!(var.property("x").unwrap().value::<i32>(), 1);
    *var.property_mut("y").unwrap().get_mut::<i32>() = 20;
    assert!(var.property("z").is_none());
    assert_eq!(point, Point { x: 1, y: 20 });
}

#[test(register)]
fn nested_properties_reach_inner_fields() {
    let mut named = Named {
        name: "origin".into(),
        origin: Point { x: 5, y: 6 },
    };
    let mut var = VarPtr::new(&mut named);

    let mut origin = var.property_mut("origin").unwrap();
    assert_eq!(origin.type_info().name(), "Point");
    *origin.property_mut("x").unwrap().get_mut::<i32>() = 50;
    assert_eq!(var.property("name").unwrap().get::<String>(), "origin");
    assert_eq!(named.origin.x, 50);
}

#[test(register)]
fn read_only_handles_give_read_only_properties() {
    let point = Point { x: 1, y: 2 };
    let mut var = VarPtr::from_ref(&point);
    let mut x = var.property_mut("x").unwrap();
    assert!(!x.is_mutable());
    assert!(matches!(
        x.try_get_mut::<i32>(),
        Err(ReflectError::ReadOnly { .. })
    ));
}

#[test(register)]
fn invalid_handles_have_no_properties() {
    let var = unsafe { VarPtr::from_raw(core::ptr::null_mut::<Point>()) };
    assert!(!var.valid());
    assert_eq!(var.type_info().name(), "Point");
    assert!(var.property("x").is_none());
}

#[test]
fn reborrowing_keeps_the_original_usable() {
    let mut value = 0usize;
    let mut var = VarPtr::new(&mut value);
    for _ in 0..3 {
        let mut again = var.reborrow();
        *again.get_mut::<usize>() += 1;
    }
    assert_eq!(var.value::<usize>(), 3);
}

#[test]
fn display_writes_the_text_form() {
    let mut value = 42i32;
    assert_eq!(VarPtr::new(&mut value).to_string(), "42");

    let mut flag = true;
    assert_eq!(VarPtr::new(&mut flag).to_string(), "true");
}
