use core::{
    alloc::Layout,
    any::{TypeId, type_name},
    marker::PhantomData,
};
use std::{collections::HashMap, sync::LazyLock};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::{
    DeserializeFn, FieldRef, FreeFunction, Function, Lifecycle, MemberFunction, MetaData,
    MetaInfo, ParseScalar, Property, Scalar, SerializeFn, TypeKind, debug,
    text::{deserialize_aggregate, deserialize_scalar, serialize_aggregate, serialize_scalar},
    trace, warning,
};

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::with_primitives);

/// The process-wide table of type records and free functions.
///
/// Records are created on first lookup and live until the process exits.
/// Lookups only take read locks, so they stay cheap once registration is done.
pub struct TypeRegistry {
    by_type: RwLock<HashMap<TypeId, MetaInfo>>,
    by_name: RwLock<HashMap<&'static str, MetaInfo>>,
    functions: RwLock<IndexMap<&'static str, &'static Function>>,
}

impl TypeRegistry {
    /// The registry. The primitives are registered before it is first
    /// handed out.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    fn empty() -> Self {
        Self {
            by_type: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
            functions: RwLock::new(IndexMap::new()),
        }
    }

    fn with_primitives() -> Self {
        let registry = Self::empty();
        registry.register_scalar::<i8>("i8").constructor();
        registry.register_scalar::<i16>("i16").constructor();
        registry.register_scalar::<i32>("i32").constructor();
        registry.register_scalar::<i64>("i64").constructor();
        registry.register_scalar::<i128>("i128").constructor();
        registry.register_scalar::<isize>("isize").constructor();
        registry.register_scalar::<u8>("u8").constructor();
        registry.register_scalar::<u16>("u16").constructor();
        registry.register_scalar::<u32>("u32").constructor();
        registry.register_scalar::<u64>("u64").constructor();
        registry.register_scalar::<u128>("u128").constructor();
        registry.register_scalar::<usize>("usize").constructor();
        registry.register_scalar::<f32>("f32").constructor();
        registry.register_scalar::<f64>("f64").constructor();
        registry.register_scalar::<bool>("bool").constructor();
        registry.register_scalar::<char>("char").constructor();
        registry.register_scalar::<String>("String").constructor();
        registry
            .register_write_only::<&'static str>("&str")
            .constructor();
        registry
    }

    /// The record for `T`, created unregistered if `T` was never seen.
    pub fn lookup<T: 'static>(&self) -> MetaInfo {
        let id = TypeId::of::<T>();
        if let Some(meta) = self.by_type.read().get(&id) {
            return *meta;
        }
        *self.by_type.write().entry(id).or_insert_with(|| {
            trace!("creating record for `{}`", type_name::<T>());
            let meta: MetaInfo = Box::leak(Box::new(MetaData::vivify::<T>()));
            meta
        })
    }

    /// The record registered under `name`, or [`MetaData::unregistered`].
    pub fn lookup_name(&self, name: &str) -> MetaInfo {
        match self.by_name.read().get(name) {
            Some(meta) => *meta,
            None => {
                trace!("no type registered as `{}`", name);
                MetaData::unregistered()
            }
        }
    }

    /// Registers `T` as a structure named `name`.
    ///
    /// A type that is already a leaf keeps its leaf routines. Registering a
    /// type under a second name makes both names resolve to it; the record
    /// reports the newest name.
    pub fn register<T: 'static>(&self, name: &'static str) -> Builder<'_, T> {
        self.register_with::<T>(name, |kind| match kind {
            TypeKind::Scalar => None,
            _ => Some((
                TypeKind::Aggregate,
                Some(serialize_aggregate as SerializeFn),
                Some(deserialize_aggregate as DeserializeFn),
            )),
        })
    }

    /// Registers `T` as a leaf named `name` that can be written and read.
    pub fn register_scalar<T: ParseScalar>(&self, name: &'static str) -> Builder<'_, T> {
        self.register_with::<T>(name, |_| {
            Some((
                TypeKind::Scalar,
                Some(serialize_scalar::<T> as SerializeFn),
                Some(deserialize_scalar::<T> as DeserializeFn),
            ))
        })
    }

    /// Registers `T` as a leaf named `name` that can only be written. Reading
    /// a value of this type leaves the memory untouched.
    pub fn register_write_only<T: Scalar>(&self, name: &'static str) -> Builder<'_, T> {
        self.register_with::<T>(name, |_| {
            Some((
                TypeKind::Scalar,
                Some(serialize_scalar::<T> as SerializeFn),
                None,
            ))
        })
    }

    fn register_with<T: 'static>(
        &self,
        name: &'static str,
        routines: impl FnOnce(TypeKind) -> Option<Routines>,
    ) -> Builder<'_, T> {
        let meta = self.lookup::<T>();
        meta.mark_registered(name, Layout::new::<T>(), |slots| {
            if let Some((kind, serialize, deserialize)) = routines(slots.kind()) {
                slots.install(kind, serialize, deserialize);
            }
        });

        let mut by_name = self.by_name.write();
        match by_name.get(name) {
            Some(existing) if !core::ptr::eq(*existing, meta) => {
                warning!(
                    "`{}` is already registered as `{}`, keeping the first",
                    name,
                    existing.rust_name()
                );
            }
            Some(_) => {}
            None => {
                by_name.insert(name, meta);
            }
        }
        drop(by_name);

        debug!("registered `{}` as `{}`", type_name::<T>(), name);
        Builder {
            registry: self,
            meta,
            _marker: PhantomData,
        }
    }

    /// Registers a free function under `name` and returns the descriptor now
    /// registered under that name.
    ///
    /// If `name` is taken, the first function stays registered.
    pub fn register_fn<Marker, F>(&self, name: &'static str, f: F) -> &'static Function
    where
        F: FreeFunction<Marker>,
    {
        if let Some(existing) = self.function(name) {
            warning!("function `{}` already registered, keeping the first", name);
            return existing;
        }
        let function = f.into_function(name, self);
        *self.functions.write().entry(name).or_insert_with(|| {
            debug!("registered function `{}`", name);
            let function: &'static Function = Box::leak(Box::new(function));
            function
        })
    }

    /// The free function registered under `name`.
    pub fn function(&self, name: &str) -> Option<&'static Function> {
        self.functions.read().get(name).copied()
    }

    /// All free functions, in registration order.
    pub fn functions(&self) -> Vec<&'static Function> {
        self.functions.read().values().copied().collect()
    }

    /// All registered names with their records, sorted by name.
    pub fn names(&self) -> Vec<(&'static str, MetaInfo)> {
        let mut names: Vec<_> = self
            .by_name
            .read()
            .iter()
            .map(|(name, meta)| (*name, *meta))
            .collect();
        names.sort_unstable_by_key(|(name, _)| *name);
        names
    }
}

type Routines = (TypeKind, Option<SerializeFn>, Option<DeserializeFn>);

/// Adds properties, functions and a constructor to a type being registered.
///
/// Returned by [`TypeRegistry::register`] and friends; every method consumes
/// and returns the builder so calls chain.
pub struct Builder<'r, T> {
    registry: &'r TypeRegistry,
    meta: MetaInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: 'static> Builder<'r, T> {
    /// The record being built.
    pub fn meta(&self) -> MetaInfo {
        self.meta
    }

    /// Adds the field `field` as a property called `name`.
    ///
    /// The field's type does not have to be registered yet; its record is
    /// created now and filled in whenever it is registered.
    ///
    /// # Panics
    ///
    /// If the field does not fit inside `T`.
    #[track_caller]
    pub fn property<M: 'static>(self, name: &'static str, field: FieldRef<T, M>) -> Self {
        assert!(
            field.offset() + size_of::<M>() <= size_of::<T>(),
            "property `{name}` at offset {} does not fit in `{}`",
            field.offset(),
            type_name::<T>()
        );
        let element_type = self.registry.lookup::<M>();
        let property: &'static Property =
            Box::leak(Box::new(Property::new(name, field.offset(), element_type)));
        self.meta.add_property(property);
        self
    }

    /// Adds `f` as a member function called `name`. `f` takes `&T` or
    /// `&mut T` first, followed by up to eight arguments.
    pub fn function<Marker, F>(self, name: &'static str, f: F) -> Self
    where
        F: MemberFunction<T, Marker>,
    {
        let function: &'static Function =
            Box::leak(Box::new(f.into_function(name, self.registry)));
        self.meta.add_function(function);
        self
    }

    /// Lets the type be created from its `Default` value, e.g. when reading
    /// it with [`crate::text::from_str_dynamic`].
    pub fn constructor(self) -> Self
    where
        T: Default,
    {
        self.meta.set_lifecycle(Lifecycle::of::<T>());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyreg_testhelpers::test;

    #[test]
    fn primitives_are_preregistered() {
        let registry = TypeRegistry::global();
        for name in [
            "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
            "usize", "f32", "f64", "bool", "char", "String", "&str",
        ] {
            let meta = registry.lookup_name(name);
            assert!(meta.valid(), "{name} should be registered");
            assert_eq!(meta.name(), name);
            assert_eq!(meta.kind(), TypeKind::Scalar);
            assert!(meta.lifecycle().is_some());
        }
        assert!(core::ptr::eq(registry.lookup::<i32>(), registry.lookup_name("i32")));
        assert_eq!(registry.lookup::<u64>().size(), 8);
        assert!(registry.lookup::<&'static str>().deserializer().is_none());
    }

    #[test]
    fn lookup_vivifies_without_naming() {
        struct Ghost;
        let registry = TypeRegistry::global();
        let first = registry.lookup::<Ghost>();
        assert!(!first.valid());
        assert_eq!(first.name(), "Unregistered");
        assert!(core::ptr::eq(first, registry.lookup::<Ghost>()));
        assert!(!core::ptr::eq(first, MetaData::unregistered()));
        assert!(!registry.lookup_name("Unregistered").valid());
    }

    #[test]
    fn misses_return_the_sentinel() {
        let registry = TypeRegistry::global();
        assert!(core::ptr::eq(
            registry.lookup_name("definitely not a type"),
            MetaData::unregistered()
        ));
        assert!(registry.function("definitely not a function").is_none());
    }

    #[test]
    fn reregistering_a_scalar_keeps_leaf_routines() {
        #[derive(Default)]
        struct Celsius(f64);
        impl Scalar for Celsius {
            fn write_scalar(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
                write!(out, "{}C", self.0)
            }
        }

        let registry = TypeRegistry::global();
        registry.register_write_only::<Celsius>("Celsius");
        registry.register::<Celsius>("Temperature");
        let meta = registry.lookup::<Celsius>();
        assert_eq!(meta.kind(), TypeKind::Scalar);
        assert_eq!(meta.name(), "Temperature");
        assert!(core::ptr::eq(registry.lookup_name("Celsius"), meta));
        assert!(core::ptr::eq(registry.lookup_name("Temperature"), meta));
    }

    #[test]
    fn zero_sized_types_are_valid_once_registered() {
        struct Marker;
        let registry = TypeRegistry::global();
        assert!(!registry.lookup::<Marker>().valid());
        let _ = registry.register::<Marker>("Marker");
        let meta = registry.lookup::<Marker>();
        assert!(meta.valid());
        assert_eq!(meta.size(), 0);
    }

    #[test]
    fn duplicate_property_keeps_the_first() {
        #[allow(dead_code)]
        struct Pair {
            a: u8,
            b: u16,
        }
        let meta = TypeRegistry::global()
            .register::<Pair>("RegistryPair")
            .property("first", crate::field!(Pair, a))
            .property("first", crate::field!(Pair, b))
            .meta();
        let first = meta.property("first").unwrap();
        assert_eq!(first.offset(), core::mem::offset_of!(Pair, a));
        assert_eq!(first.element_type().name(), "u8");
        assert_eq!(meta.properties().len(), 1);
    }
}
