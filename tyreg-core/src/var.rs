use core::{any::type_name, fmt, marker::PhantomData};

use crate::{
    Function, MetaData, MetaInfo, Property, PtrConst, PtrMut, ReflectError, TypeRegistry,
    text::{self, TextError},
};

/// A type-erased handle to a value of a registered type.
///
/// A `VarPtr` is a data pointer plus the [`MetaData`] record of the type
/// behind it. It never owns the value: the `'mem` lifetime ties it to the
/// borrow it was made from. Typed access checks the requested type against
/// the record by identity; asking for anything else is a programmer error and
/// panics, while the `try_*` variants report it as a [`ReflectError`].
///
/// Handles made from shared references are read-only and refuse mutable
/// access.
pub struct VarPtr<'mem> {
    data: PtrMut,
    meta: MetaInfo,
    mutable: bool,
    _marker: PhantomData<&'mem mut ()>,
}

impl<'mem> VarPtr<'mem> {
    /// A handle to `value`, allowing mutation.
    ///
    /// # Panics
    ///
    /// If `T` is not registered.
    #[track_caller]
    pub fn new<T: 'static>(value: &'mem mut T) -> Self {
        Self {
            data: PtrMut::new(value as *mut T),
            meta: registered::<T>(),
            mutable: true,
            _marker: PhantomData,
        }
    }

    /// A read-only handle to `value`.
    ///
    /// # Panics
    ///
    /// If `T` is not registered.
    #[track_caller]
    pub fn from_ref<T: 'static>(value: &'mem T) -> Self {
        Self {
            data: PtrMut::new(value as *const T as *mut T),
            meta: registered::<T>(),
            mutable: false,
            _marker: PhantomData,
        }
    }

    /// A handle to whatever `ptr` points at. A null pointer gives a handle that
    /// carries `T`'s record but is not [valid](Self::valid).
    ///
    /// # Panics
    ///
    /// If `T` is not registered.
    ///
    /// # Safety
    ///
    /// If non-null, `ptr` must point to an initialized `T` that stays alive
    /// and unaliased for `'mem`.
    #[track_caller]
    pub unsafe fn from_raw<T: 'static>(ptr: *mut T) -> Self {
        Self {
            data: PtrMut::new(ptr),
            meta: registered::<T>(),
            mutable: true,
            _marker: PhantomData,
        }
    }

    /// A handle assembled from its parts.
    ///
    /// # Safety
    ///
    /// If non-null, `data` must point to an initialized value of the type
    /// `meta` describes, alive for `'mem`. A mutable handle additionally needs
    /// exclusive access for `'mem`.
    pub unsafe fn from_parts(data: PtrMut, meta: MetaInfo, mutable: bool) -> Self {
        Self {
            data,
            meta,
            mutable,
            _marker: PhantomData,
        }
    }

    /// A handle to nothing: null data, the unregistered record.
    pub fn invalid() -> Self {
        Self {
            data: PtrMut::null(),
            meta: MetaData::unregistered(),
            mutable: false,
            _marker: PhantomData,
        }
    }

    /// Whether the handle points at something of a registered type.
    pub fn valid(&self) -> bool {
        !self.data.is_null() && self.meta.valid()
    }

    /// Record of the type behind the handle.
    pub fn type_info(&self) -> MetaInfo {
        self.meta
    }

    /// The untyped data pointer.
    pub fn data(&self) -> PtrConst {
        self.data.as_const()
    }

    /// Whether mutable access is allowed.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Whether the handle carries `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.meta.is::<T>()
    }

    fn check_type<T: 'static>(&self) -> Result<(), ReflectError> {
        if self.meta.is::<T>() {
            Ok(())
        } else {
            Err(ReflectError::WrongType {
                requested: type_name::<T>(),
                actual: self.meta.name(),
            })
        }
    }

    /// Borrows the value as a `T`.
    pub fn try_get<T: 'static>(&self) -> Result<&T, ReflectError> {
        self.check_type::<T>()?;
        if self.data.is_null() {
            return Err(ReflectError::InvalidHandle);
        }
        // SAFETY: the record says the data is a `T`, and it is non-null
        Ok(unsafe { self.data.get::<T>() })
    }

    /// Mutably borrows the value as a `T`.
    pub fn try_get_mut<T: 'static>(&mut self) -> Result<&mut T, ReflectError> {
        self.check_type::<T>()?;
        if self.data.is_null() {
            return Err(ReflectError::InvalidHandle);
        }
        if !self.mutable {
            return Err(ReflectError::ReadOnly {
                type_name: self.meta.name(),
            });
        }
        // SAFETY: the record says the data is a `T`, it is non-null, and the
        // handle was made with exclusive access
        Ok(unsafe { self.data.as_mut::<T>() })
    }

    /// Borrows the value as a `T`.
    ///
    /// # Panics
    ///
    /// If the handle carries another type or is not valid.
    #[track_caller]
    pub fn get<T: 'static>(&self) -> &T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutably borrows the value as a `T`.
    ///
    /// # Panics
    ///
    /// If the handle carries another type, is not valid, or is read-only.
    #[track_caller]
    pub fn get_mut<T: 'static>(&mut self) -> &mut T {
        match self.try_get_mut() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// A copy of the value.
    ///
    /// # Panics
    ///
    /// Same as [`VarPtr::get`].
    #[track_caller]
    pub fn value<T: Clone + 'static>(&self) -> T {
        self.get::<T>().clone()
    }

    /// The data pointer as a `*const T`. May be null.
    ///
    /// # Panics
    ///
    /// If the handle carries another type.
    #[track_caller]
    pub fn as_ptr<T: 'static>(&self) -> *const T {
        if let Err(err) = self.check_type::<T>() {
            panic!("{err}");
        }
        self.data.as_ptr::<T>()
    }

    /// The data pointer as a `*mut T`. May be null.
    ///
    /// # Panics
    ///
    /// If the handle carries another type or is read-only.
    #[track_caller]
    pub fn as_mut_ptr<T: 'static>(&mut self) -> *mut T {
        if let Err(err) = self.check_type::<T>() {
            panic!("{err}");
        }
        if !self.mutable {
            panic!(
                "{}",
                ReflectError::ReadOnly {
                    type_name: self.meta.name()
                }
            );
        }
        self.data.as_mut_ptr::<T>()
    }

    /// A shorter-lived handle to the same value, so this one can be used
    /// again afterwards.
    pub fn reborrow(&mut self) -> VarPtr<'_> {
        VarPtr {
            data: self.data,
            meta: self.meta,
            mutable: self.mutable,
            _marker: PhantomData,
        }
    }

    /// A read-only handle to the same value.
    pub fn as_const(&self) -> VarPtr<'_> {
        VarPtr {
            data: self.data,
            meta: self.meta,
            mutable: false,
            _marker: PhantomData,
        }
    }

    /// A read-only handle to the property called `name`.
    pub fn property(&self, name: &str) -> Option<VarPtr<'_>> {
        if !self.valid() {
            return None;
        }
        self.meta.property(name).map(|property| self.field(property))
    }

    /// A handle to the property called `name`, mutable if this handle is.
    pub fn property_mut(&mut self, name: &str) -> Option<VarPtr<'_>> {
        if !self.valid() {
            return None;
        }
        let property = self.meta.property(name)?;
        Some(self.field_mut(property))
    }

    pub(crate) fn field(&self, property: &Property) -> VarPtr<'_> {
        VarPtr {
            // SAFETY: properties are registered with in-bounds offsets
            data: unsafe { self.data.field(property.offset()) },
            meta: property.element_type(),
            mutable: false,
            _marker: PhantomData,
        }
    }

    pub(crate) fn field_mut(&mut self, property: &Property) -> VarPtr<'_> {
        VarPtr {
            // SAFETY: properties are registered with in-bounds offsets
            data: unsafe { self.data.field(property.offset()) },
            meta: property.element_type(),
            mutable: self.mutable,
            _marker: PhantomData,
        }
    }

    /// The member function `name` of this handle's type.
    pub fn function(&self, name: &str) -> Option<&'static Function> {
        self.meta.function(name)
    }

    /// Calls the member function `name` with this handle as the receiver.
    ///
    /// # Panics
    ///
    /// If the type has no such function, or the call itself panics (see
    /// [`Function::call`]).
    #[track_caller]
    pub fn call_method(&mut self, name: &str, ret: &mut VarPtr<'_>, args: &mut [VarPtr<'_>]) {
        let Some(function) = self.meta.function(name) else {
            panic!("`{}` has no function `{name}`", self.meta.name());
        };
        function.call(ret, self, args);
    }

    /// Writes the value in the text format.
    pub fn serialize(&self, out: &mut dyn fmt::Write) -> Result<(), TextError> {
        text::to_writer(self, out)
    }

    /// Reads the value from the text format.
    pub fn deserialize(&mut self, input: &str) -> Result<(), TextError> {
        text::from_str(input, self)
    }
}

#[track_caller]
fn registered<T: 'static>() -> MetaInfo {
    let meta = TypeRegistry::global().lookup::<T>();
    if !meta.valid() {
        panic!(
            "{}",
            ReflectError::Unregistered {
                type_name: type_name::<T>()
            }
        );
    }
    meta
}

impl Default for VarPtr<'_> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<'mem, T: 'static> From<&'mem mut T> for VarPtr<'mem> {
    #[track_caller]
    fn from(value: &'mem mut T) -> Self {
        Self::new(value)
    }
}

impl<'mem, T: 'static> From<&'mem T> for VarPtr<'mem> {
    #[track_caller]
    fn from(value: &'mem T) -> Self {
        Self::from_ref(value)
    }
}

impl fmt::Display for VarPtr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        text::to_writer(self, f)?;
        Ok(())
    }
}

impl fmt::Debug for VarPtr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VarPtr")
            .field("type", &self.meta.name())
            .field("data", &self.data)
            .field("mutable", &self.mutable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyreg_testhelpers::test;

    #[test]
    fn default_handle_is_invalid() {
        let var = VarPtr::default();
        assert!(!var.valid());
        assert!(!var.type_info().valid());
        assert!(var.data().is_null());
        assert!(var.property("x").is_none());
    }

    #[test]
    fn null_raw_pointer_keeps_its_type() {
        let var = unsafe { VarPtr::from_raw(core::ptr::null_mut::<i32>()) };
        assert!(!var.valid());
        assert_eq!(var.type_info().name(), "i32");
        assert!(matches!(var.try_get::<i32>(), Err(ReflectError::InvalidHandle)));
        assert!(var.as_ptr::<i32>().is_null());
    }

    #[test]
    fn read_only_handles_refuse_mutation() {
        let value = 5u8;
        let mut var = VarPtr::from_ref(&value);
        assert!(!var.is_mutable());
        assert_eq!(*var.get::<u8>(), 5);
        assert!(matches!(
            var.try_get_mut::<u8>(),
            Err(ReflectError::ReadOnly { type_name: "u8" })
        ));
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut value = 5u8;
        let var = VarPtr::new(&mut value);
        assert!(matches!(
            var.try_get::<i64>(),
            Err(ReflectError::WrongType {
                requested: "i64",
                actual: "u8"
            })
        ));
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn unregistered_types_cannot_make_handles() {
        struct Nobody;
        let mut nobody = Nobody;
        let _ = VarPtr::new(&mut nobody);
    }

    #[test]
    fn reborrow_then_reuse() {
        let mut value = 1i32;
        let mut var = VarPtr::new(&mut value);
        *var.reborrow().get_mut::<i32>() += 1;
        *var.get_mut::<i32>() += 1;
        assert_eq!(value, 3);
    }
}
