use core::{alloc::Layout, any::TypeId, fmt, ptr};
use std::sync::LazyLock;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::{
    Function, Property, PtrMut, PtrUninit, VarPtr,
    text::{TextDeserializer, TextError, TextSerializer},
    warning,
};

/// Name reported by records that have not been registered.
pub const UNREGISTERED_NAME: &str = "Unregistered";

/// A reference to a metadata record. Records live for the whole process, and
/// two references denote the same type exactly when they are the same pointer.
pub type MetaInfo = &'static MetaData;

/// Writes the value behind a handle in the text format.
pub type SerializeFn = fn(&mut TextSerializer<'_>, &VarPtr<'_>) -> Result<(), TextError>;

/// Reads a value in the text format into the memory behind a handle.
pub type DeserializeFn = fn(&mut TextDeserializer<'_>, &mut VarPtr<'_>) -> Result<(), TextError>;

/// Default-constructs a value in place.
///
/// # Safety
///
/// The pointer must be allocated with the record's layout.
pub type DefaultInPlaceFn = unsafe fn(PtrUninit) -> PtrMut;

/// Drops a value in place.
///
/// # Safety
///
/// The pointer must point to an initialized value of the record's type.
pub type DropInPlaceFn = unsafe fn(PtrMut);

/// What a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Nothing registered the type yet.
    Unregistered,
    /// A leaf: serialized through its own routine, no properties.
    Scalar,
    /// A structure serialized property by property.
    Aggregate,
}

/// How values of a type are created and destroyed without knowing the type.
#[derive(Clone, Copy)]
pub struct Lifecycle {
    /// Memory layout of the type.
    pub layout: Layout,
    /// Writes the default value into fresh memory.
    pub default_in_place: DefaultInPlaceFn,
    /// Runs the type's destructor.
    pub drop_in_place: DropInPlaceFn,
}

impl Lifecycle {
    /// Lifecycle of a `Default` type.
    pub fn of<T: Default>() -> Self {
        unsafe fn default_in_place<T: Default>(target: PtrUninit) -> PtrMut {
            unsafe { target.put(T::default()) }
        }

        unsafe fn drop_in_place<T>(target: PtrMut) {
            unsafe { core::ptr::drop_in_place(target.as_mut_ptr::<T>()) }
        }

        Self {
            layout: Layout::new::<T>(),
            default_in_place: default_in_place::<T>,
            drop_in_place: drop_in_place::<T>,
        }
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Everything the registry knows about one type.
///
/// A record is created the first time its type is looked up and filled in
/// when the type is registered. Its address never changes afterwards, so
/// handles compare types by comparing record pointers.
pub struct MetaData {
    id: Option<TypeId>,
    rust_name: &'static str,
    state: RwLock<MetaState>,
}

struct MetaState {
    name: &'static str,
    registered: bool,
    kind: TypeKind,
    size: usize,
    align: usize,
    properties: IndexMap<&'static str, &'static Property>,
    functions: IndexMap<&'static str, &'static Function>,
    serialize: Option<SerializeFn>,
    deserialize: Option<DeserializeFn>,
    lifecycle: Option<Lifecycle>,
}

impl MetaState {
    fn blank() -> Self {
        Self {
            name: UNREGISTERED_NAME,
            registered: false,
            kind: TypeKind::Unregistered,
            size: 0,
            align: 0,
            properties: IndexMap::new(),
            functions: IndexMap::new(),
            serialize: None,
            deserialize: None,
            lifecycle: None,
        }
    }
}

static UNREGISTERED: LazyLock<MetaData> = LazyLock::new(|| MetaData {
    id: None,
    rust_name: UNREGISTERED_NAME,
    state: RwLock::new(MetaState::blank()),
});

impl MetaData {
    /// The shared record returned by lookups that find nothing. It is never
    /// valid and nothing ever registers it.
    pub fn unregistered() -> MetaInfo {
        &UNREGISTERED
    }

    /// A fresh, not yet registered record for `T`.
    pub(crate) fn vivify<T: 'static>() -> Self {
        Self {
            id: Some(TypeId::of::<T>()),
            rust_name: core::any::type_name::<T>(),
            state: RwLock::new(MetaState::blank()),
        }
    }

    /// Registered name, or `"Unregistered"`.
    pub fn name(&self) -> &'static str {
        self.state.read().name
    }

    /// Size in bytes; 0 before registration.
    pub fn size(&self) -> usize {
        self.state.read().size
    }

    /// Alignment in bytes; 0 before registration.
    pub fn align(&self) -> usize {
        self.state.read().align
    }

    /// Whether the type has been registered.
    pub fn valid(&self) -> bool {
        self.state.read().registered
    }

    /// What kind of type this record describes.
    pub fn kind(&self) -> TypeKind {
        self.state.read().kind
    }

    /// The `TypeId` this record belongs to. `None` for the shared sentinel.
    pub fn type_id(&self) -> Option<TypeId> {
        self.id
    }

    /// The Rust spelling of the type, as reported by `core::any::type_name`.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Whether this record describes `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.id == Some(TypeId::of::<T>())
    }

    /// All properties, in registration order.
    pub fn properties(&self) -> Vec<&'static Property> {
        self.state.read().properties.values().copied().collect()
    }

    /// The property registered under `name`.
    pub fn property(&self, name: &str) -> Option<&'static Property> {
        self.state.read().properties.get(name).copied()
    }

    /// All member functions, in registration order.
    pub fn functions(&self) -> Vec<&'static Function> {
        self.state.read().functions.values().copied().collect()
    }

    /// The member function registered under `name`.
    pub fn function(&self, name: &str) -> Option<&'static Function> {
        self.state.read().functions.get(name).copied()
    }

    /// The routine that writes values of this type, if any.
    pub fn serializer(&self) -> Option<SerializeFn> {
        self.state.read().serialize
    }

    /// The routine that reads values of this type, if any.
    pub fn deserializer(&self) -> Option<DeserializeFn> {
        self.state.read().deserialize
    }

    /// How to create and destroy values of this type, if known.
    pub fn lifecycle(&self) -> Option<Lifecycle> {
        self.state.read().lifecycle
    }

    pub(crate) fn mark_registered(
        &self,
        name: &'static str,
        layout: Layout,
        routines: impl FnOnce(&mut dyn RoutineSlots),
    ) {
        let mut state = self.state.write();
        state.name = name;
        state.registered = true;
        state.size = layout.size();
        state.align = layout.align();
        routines(&mut *state);
    }

    pub(crate) fn add_property(&self, property: &'static Property) {
        let mut state = self.state.write();
        if state.properties.contains_key(property.name()) {
            warning!(
                "property `{}` already registered on `{}`, keeping the first",
                property.name(),
                state.name
            );
            return;
        }
        state.properties.insert(property.name(), property);
    }

    pub(crate) fn add_function(&self, function: &'static Function) {
        let mut state = self.state.write();
        if state.functions.contains_key(function.name()) {
            warning!(
                "function `{}` already registered on `{}`, keeping the first",
                function.name(),
                state.name
            );
            return;
        }
        state.functions.insert(function.name(), function);
    }

    pub(crate) fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.state.write().lifecycle = Some(lifecycle);
    }
}

/// Write access to a record's routine slots while it is being registered.
pub(crate) trait RoutineSlots {
    fn kind(&self) -> TypeKind;
    fn install(
        &mut self,
        kind: TypeKind,
        serialize: Option<SerializeFn>,
        deserialize: Option<DeserializeFn>,
    );
}

impl RoutineSlots for MetaState {
    fn kind(&self) -> TypeKind {
        self.kind
    }

    fn install(
        &mut self,
        kind: TypeKind,
        serialize: Option<SerializeFn>,
        deserialize: Option<DeserializeFn>,
    ) {
        self.kind = kind;
        self.serialize = serialize;
        self.deserialize = deserialize;
    }
}

impl PartialEq for MetaData {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for MetaData {}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("MetaData")
            .field("name", &state.name)
            .field("rust_name", &self.rust_name)
            .field("kind", &state.kind)
            .field("size", &state.size)
            .field("properties", &state.properties.keys().collect::<Vec<_>>())
            .field("functions", &state.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyreg_testhelpers::test;

    #[test]
    fn sentinel_is_never_valid() {
        let sentinel = MetaData::unregistered();
        assert!(!sentinel.valid());
        assert_eq!(sentinel.name(), "Unregistered");
        assert_eq!(sentinel.size(), 0);
        assert_eq!(sentinel.kind(), TypeKind::Unregistered);
        assert!(sentinel.type_id().is_none());
        assert!(core::ptr::eq(sentinel, MetaData::unregistered()));
    }

    #[test]
    fn vivified_record_reports_defaults() {
        struct Fresh;
        let meta = MetaData::vivify::<Fresh>();
        assert!(!meta.valid());
        assert_eq!(meta.name(), "Unregistered");
        assert!(meta.is::<Fresh>());
        assert!(!meta.is::<u8>());
        assert!(meta.properties().is_empty());
        assert!(meta.function("anything").is_none());
    }

    #[test]
    fn registration_fills_layout_and_routines() {
        struct Unit;
        let meta = MetaData::vivify::<Unit>();
        meta.mark_registered("Unit", Layout::new::<Unit>(), |slots| {
            slots.install(TypeKind::Aggregate, None, None)
        });
        assert!(meta.valid());
        assert_eq!(meta.size(), 0);
        assert_eq!(meta.align(), 1);
        assert_eq!(meta.kind(), TypeKind::Aggregate);
        assert_eq!(meta.to_string(), "Unit");
    }
}
