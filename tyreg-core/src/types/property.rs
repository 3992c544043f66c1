use core::{fmt, marker::PhantomData};

use crate::MetaInfo;

/// A named field of a registered type: where it lives inside the owner and
/// what type it holds.
pub struct Property {
    name: &'static str,
    offset: usize,
    element_type: MetaInfo,
}

impl Property {
    pub(crate) fn new(name: &'static str, offset: usize, element_type: MetaInfo) -> Self {
        Self {
            name,
            offset,
            element_type,
        }
    }

    /// Name the property was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Byte offset of the field from the start of its owner.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Record of the field's type.
    pub fn element_type(&self) -> MetaInfo {
        self.element_type
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("element_type", &self.element_type.name())
            .finish()
    }
}

/// A typed reference to a field of `C` holding an `M`, as produced by
/// [`field!`](crate::field).
///
/// Carries the byte offset while keeping both types around for the builder.
pub struct FieldRef<C, M> {
    offset: usize,
    _marker: PhantomData<fn(&C) -> &M>,
}

impl<C, M> FieldRef<C, M> {
    /// Creates a field reference.
    ///
    /// The projection is never called; it only pins down `M`.
    ///
    /// # Safety
    ///
    /// `offset` must be the byte offset of a field of type `M` inside `C`.
    pub const unsafe fn new(offset: usize, _projection: fn(&C) -> &M) -> Self {
        Self {
            offset,
            _marker: PhantomData,
        }
    }

    /// Byte offset of the field.
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<C, M> Clone for FieldRef<C, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, M> Copy for FieldRef<C, M> {}

impl<C, M> fmt::Debug for FieldRef<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRef")
            .field("container", &core::any::type_name::<C>())
            .field("field", &core::any::type_name::<M>())
            .field("offset", &self.offset)
            .finish()
    }
}

/// Names a field of a struct for property registration.
///
/// ```
/// use tyreg_core::{field, FieldRef};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let y: FieldRef<Point, i32> = field!(Point, y);
/// assert_eq!(y.offset(), core::mem::offset_of!(Point, y));
/// ```
#[macro_export]
macro_rules! field {
    ($container:ty, $field:ident) => {{
        // SAFETY: the offset and the projection name the same field
        unsafe {
            $crate::FieldRef::<$container, _>::new(
                ::core::mem::offset_of!($container, $field),
                |container: &$container| &container.$field,
            )
        }
    }};
}
