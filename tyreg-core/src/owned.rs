use core::fmt;

use crate::{Lifecycle, MetaInfo, PtrMut, ReflectError, VarPtr, alloc_for_layout, dealloc_for_layout};

/// A heap-allocated value whose type is only known through its record.
///
/// Created from a record's constructor (see
/// [`Builder::constructor`](crate::Builder::constructor)), dropped through its
/// destructor.
pub struct OwnedVar {
    data: PtrMut,
    meta: MetaInfo,
    lifecycle: Lifecycle,
}

impl OwnedVar {
    /// Allocates a default value of the type `meta` describes.
    pub fn new(meta: MetaInfo) -> Result<Self, ReflectError> {
        let Some(lifecycle) = meta.lifecycle() else {
            return Err(ReflectError::NoConstructor {
                type_name: meta.name(),
            });
        };
        let uninit = alloc_for_layout(lifecycle.layout);
        // SAFETY: allocated with the layout the constructor was made for
        let data = unsafe { (lifecycle.default_in_place)(uninit) };
        Ok(Self {
            data,
            meta,
            lifecycle,
        })
    }

    /// Record of the value's type.
    pub fn type_info(&self) -> MetaInfo {
        self.meta
    }

    /// A read-only handle to the value.
    pub fn as_var(&self) -> VarPtr<'_> {
        // SAFETY: the value is initialized and lives as long as `self`
        unsafe { VarPtr::from_parts(self.data, self.meta, false) }
    }

    /// A mutable handle to the value.
    pub fn as_var_mut(&mut self) -> VarPtr<'_> {
        // SAFETY: as above, and `&mut self` gives exclusive access
        unsafe { VarPtr::from_parts(self.data, self.meta, true) }
    }

    /// Moves the value out as a `T`, or gives `self` back if it is not one.
    pub fn into_inner<T: 'static>(self) -> Result<T, Self> {
        if !self.meta.is::<T>() {
            return Err(self);
        }
        let this = core::mem::ManuallyDrop::new(self);
        // SAFETY: the record says the data is a `T`; reading it out transfers
        // ownership, so only the allocation is released below
        unsafe {
            let value = core::ptr::read(this.data.as_ptr::<T>());
            dealloc_for_layout(this.data, this.lifecycle.layout);
            Ok(value)
        }
    }
}

impl Drop for OwnedVar {
    fn drop(&mut self) {
        // SAFETY: the value was built by the matching constructor and is
        // dropped exactly once
        unsafe {
            (self.lifecycle.drop_in_place)(self.data);
            dealloc_for_layout(self.data, self.lifecycle.layout);
        }
    }
}

impl fmt::Display for OwnedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_var(), f)
    }
}

impl fmt::Debug for OwnedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedVar")
            .field("type", &self.meta.name())
            .field("data", &self.data)
            .finish()
    }
}
