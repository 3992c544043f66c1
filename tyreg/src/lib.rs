#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use tyreg_core::*;

pub use tyreg_core::field;

/// Registers `T` as a structure named `name` in the global registry.
///
/// Chain [`Builder::property`], [`Builder::function`] and
/// [`Builder::constructor`] on the result to describe it.
pub fn reflect<T: 'static>(name: &'static str) -> Builder<'static, T> {
    TypeRegistry::global().register::<T>(name)
}

/// Registers `T` as a leaf type named `name` in the global registry.
pub fn reflect_scalar<T: ParseScalar>(name: &'static str) -> Builder<'static, T> {
    TypeRegistry::global().register_scalar::<T>(name)
}

/// Registers a free function named `name` in the global registry.
pub fn reflect_fn<Marker, F>(name: &'static str, f: F) -> &'static Function
where
    F: FreeFunction<Marker>,
{
    TypeRegistry::global().register_fn(name, f)
}

/// The record for `T`. Unregistered types get a record that is not valid.
pub fn type_of<T: 'static>() -> MetaInfo {
    TypeRegistry::global().lookup::<T>()
}

/// The record registered under `name`, or [`MetaData::unregistered`].
pub fn type_named(name: &str) -> MetaInfo {
    TypeRegistry::global().lookup_name(name)
}

/// The free function registered under `name`.
pub fn function_named(name: &str) -> Option<&'static Function> {
    TypeRegistry::global().function(name)
}

/// Everything needed to register types and work with handles.
pub mod prelude {
    pub use crate::{
        MetaInfo, OwnedVar, VarPtr, field, function_named, reflect, reflect_fn, reflect_scalar,
        type_named, type_of,
    };
}
