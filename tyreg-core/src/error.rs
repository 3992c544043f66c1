use core::fmt;

/// Errors that can occur when accessing values through a [`crate::VarPtr`]
/// or dispatching a reflected call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReflectError {
    /// A typed access asked for a type other than the one the handle carries.
    WrongType {
        /// Rust type name that was requested.
        requested: &'static str,
        /// Registered name of the type the handle actually carries.
        actual: &'static str,
    },

    /// The handle's metadata is not registered.
    Unregistered {
        /// Rust type name of the unregistered type.
        type_name: &'static str,
    },

    /// The handle's data pointer is null, or its metadata is unregistered.
    InvalidHandle,

    /// Mutable access was requested through a read-only handle.
    ReadOnly {
        /// Registered name of the type behind the handle.
        type_name: &'static str,
    },

    /// A reflected call was made with the wrong number of arguments.
    ArityMismatch {
        /// Name the function was registered under.
        function: &'static str,
        /// Number of arguments the function takes.
        expected: usize,
        /// Number of arguments that were passed.
        actual: usize,
    },

    /// A member function was called without a usable receiver.
    MissingReceiver {
        /// Name the function was registered under.
        function: &'static str,
    },

    /// A value could not be created because its type has no constructor.
    NoConstructor {
        /// Registered name of the type.
        type_name: &'static str,
    },
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectError::WrongType { requested, actual } => {
                write!(
                    f,
                    "Wrong type: requested `{requested}`, but the handle carries `{actual}`"
                )
            }
            ReflectError::Unregistered { type_name } => {
                write!(f, "Type `{type_name}` is not registered")
            }
            ReflectError::InvalidHandle => write!(f, "Handle is invalid"),
            ReflectError::ReadOnly { type_name } => {
                write!(f, "Handle to `{type_name}` is read-only")
            }
            ReflectError::ArityMismatch {
                function,
                expected,
                actual,
            } => write!(
                f,
                "Function `{function}` takes {expected} argument(s), but {actual} were passed"
            ),
            ReflectError::MissingReceiver { function } => {
                write!(f, "Member function `{function}` was called without a receiver")
            }
            ReflectError::NoConstructor { type_name } => {
                write!(f, "Type `{type_name}` has no registered constructor")
            }
        }
    }
}

impl core::error::Error for ReflectError {}
