//! Opaque pointers
//!
//! Type-erased pointer helpers for working with registered values.
//!
//! # Pointer Types
//!
//! - `PtrMut` - Raw mutable pointer, can do everything
//! - `PtrConst` - Read-only view of the address, as handed out by `VarPtr::data`
//! - `PtrUninit` - Points at allocated but uninitialized memory
//!
//! Every registered type is `Sized`, so all of these are thin pointers. None of
//! them carry a lifetime: `VarPtr` is where lifetimes get attached.

use core::{alloc::Layout, fmt};

// ============================================================================
// PtrMut - The base mutable pointer type
// ============================================================================

/// A type-erased mutable pointer.
///
/// May be null: a `VarPtr` built from a null raw pointer keeps its metadata
/// but reports itself invalid.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PtrMut {
    ptr: *mut u8,
}

impl fmt::Debug for PtrMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ptr.fmt(f)
    }
}

impl PtrMut {
    /// Creates a new mutable pointer from a raw pointer to a sized type.
    #[inline]
    pub const fn new<T>(ptr: *mut T) -> Self {
        Self {
            ptr: ptr as *mut u8,
        }
    }

    /// The null pointer.
    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: core::ptr::null_mut(),
        }
    }

    /// Returns true if the pointer is null.
    #[inline]
    pub fn is_null(self) -> bool {
        self.ptr.is_null()
    }

    /// Convert to a `PtrConst`.
    #[inline]
    pub const fn as_const(self) -> PtrConst {
        PtrConst { ptr: self.ptr }
    }

    /// Returns the underlying raw pointer as a mutable byte pointer.
    #[inline]
    pub const fn as_mut_byte_ptr(self) -> *mut u8 {
        self.ptr
    }

    /// Gets the underlying raw pointer as a const pointer of type T.
    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.ptr as *const T
    }

    /// Gets the underlying raw pointer as a mutable pointer of type T.
    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.ptr as *mut T
    }

    /// Borrows the underlying object as a reference of type `T`.
    ///
    /// # Safety
    /// - `T` must be the actual underlying type
    /// - The memory must be valid and initialized
    /// - No mutable references may exist
    /// - The returned reference must not outlive the actual data
    #[inline]
    pub unsafe fn get<'a, T>(self) -> &'a T {
        unsafe { &*(self.ptr as *const T) }
    }

    /// Borrows the underlying object as a mutable reference of type `T`.
    ///
    /// # Safety
    /// - `T` must be the actual underlying type
    /// - The memory must be valid and initialized
    /// - Caller must have exclusive access
    /// - The returned reference must not outlive the actual data
    #[inline]
    pub unsafe fn as_mut<'a, T>(self) -> &'a mut T {
        unsafe { &mut *(self.ptr as *mut T) }
    }

    /// Returns a pointer with the given offset added.
    ///
    /// # Safety
    /// The pointer must be non-null and the offset must be within the bounds
    /// of the allocated object.
    #[inline]
    pub unsafe fn field(self, offset: usize) -> PtrMut {
        PtrMut {
            ptr: unsafe { self.ptr.add(offset) },
        }
    }
}

// ============================================================================
// PtrConst - read-only view
// ============================================================================

/// A type-erased read-only pointer.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PtrConst {
    ptr: *const u8,
}

impl fmt::Debug for PtrConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ptr.fmt(f)
    }
}

impl PtrConst {
    /// Returns true if the pointer is null.
    #[inline]
    pub fn is_null(self) -> bool {
        self.ptr.is_null()
    }

    /// Gets the underlying raw pointer as a const pointer of type T.
    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.ptr as *const T
    }
}

// ============================================================================
// PtrUninit - allocated, not yet initialized
// ============================================================================

/// A type-erased pointer to uninitialized memory.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PtrUninit {
    ptr: PtrMut,
}

impl fmt::Debug for PtrUninit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ptr.fmt(f)
    }
}

impl PtrUninit {
    /// Create a new uninit pointer from a pointer to a sized type.
    #[inline]
    pub const fn new<T>(ptr: *mut T) -> Self {
        Self {
            ptr: PtrMut::new(ptr),
        }
    }

    /// Returns the underlying raw pointer as a mutable byte pointer.
    #[inline]
    pub const fn as_mut_byte_ptr(self) -> *mut u8 {
        self.ptr.as_mut_byte_ptr()
    }

    /// Assumes the pointer is initialized and returns a `PtrMut`.
    ///
    /// # Safety
    /// The memory must actually be initialized.
    #[inline]
    pub const unsafe fn assume_init(self) -> PtrMut {
        self.ptr
    }

    /// Write a value to this location and return an initialized pointer.
    ///
    /// # Safety
    /// The pointer must be properly aligned and point to allocated memory.
    #[inline]
    pub unsafe fn put<T>(self, value: T) -> PtrMut {
        unsafe {
            core::ptr::write(self.ptr.as_mut_ptr::<T>(), value);
            self.assume_init()
        }
    }
}

// ============================================================================
// Allocation Helpers
// ============================================================================

/// Allocates memory for a layout, correctly handling zero-sized types.
///
/// For ZSTs, returns a dangling but properly aligned pointer without actually
/// allocating, since `std::alloc::alloc` with a zero-sized layout is UB.
///
/// # Panics
///
/// Aborts through `handle_alloc_error` if allocation fails.
pub fn alloc_for_layout(layout: Layout) -> PtrUninit {
    if layout.size() == 0 {
        PtrUninit::new(core::ptr::null_mut::<u8>().wrapping_byte_add(layout.align()))
    } else {
        // SAFETY: layout.size() > 0
        let ptr = unsafe { std::alloc::alloc(layout) };
        if ptr.is_null() {
            std::alloc::handle_alloc_error(layout);
        }
        PtrUninit::new(ptr)
    }
}

/// Deallocates memory for a layout, correctly handling zero-sized types.
///
/// # Safety
///
/// - For non-ZST layouts, `ptr` must have been allocated by [`alloc_for_layout`]
///   with the same layout.
/// - `ptr` must not have been deallocated already.
pub unsafe fn dealloc_for_layout(ptr: PtrMut, layout: Layout) {
    if layout.size() == 0 {
        return;
    }
    unsafe { std::alloc::dealloc(ptr.as_mut_byte_ptr(), layout) }
}
