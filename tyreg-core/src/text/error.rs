use core::fmt;

use crate::ReflectError;

/// Errors produced while writing or reading the text format.
#[derive(Debug)]
#[non_exhaustive]
pub enum TextError {
    /// Access through a handle failed.
    Reflect(ReflectError),

    /// The output sink refused a write.
    Fmt(fmt::Error),

    /// Reading or writing an I/O stream failed.
    Io(std::io::Error),

    /// The input ended while something was still expected.
    UnexpectedEof {
        /// What the reader was waiting for.
        expected: &'static str,
    },

    /// The input names a different type than the one being read into.
    TypeMismatch {
        /// Registered name of the target type.
        expected: &'static str,
        /// Type name found in the input.
        found: String,
    },

    /// A fixed token such as `{` or `=` was expected.
    ExpectedToken {
        /// The token that should have come next.
        expected: &'static str,
        /// What came instead.
        found: String,
    },

    /// A leaf literal could not be parsed.
    InvalidLiteral {
        /// Registered name of the leaf type.
        type_name: &'static str,
        /// The offending token.
        token: String,
    },

    /// Strict mode met a property the type does not have.
    UnknownProperty {
        /// Registered name of the type being read.
        type_name: &'static str,
        /// The unknown property name.
        property: String,
    },

    /// Dynamic reading met a type name nothing is registered under.
    UnknownType {
        /// The type name found in the input.
        name: String,
    },

    /// Dynamic reading met a type that cannot be default-constructed.
    NoConstructor {
        /// Registered name of the type.
        type_name: &'static str,
    },
}

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextError::Reflect(err) => write!(f, "{err}"),
            TextError::Fmt(_) => write!(f, "Formatter error"),
            TextError::Io(err) => write!(f, "I/O error: {err}"),
            TextError::UnexpectedEof { expected } => {
                write!(f, "Unexpected end of input, expected {expected}")
            }
            TextError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected `{expected}`, found `{found}`")
            }
            TextError::ExpectedToken { expected, found } => {
                write!(f, "Expected `{expected}`, found `{found}`")
            }
            TextError::InvalidLiteral { type_name, token } => {
                write!(f, "Invalid `{type_name}` literal: `{token}`")
            }
            TextError::UnknownProperty {
                type_name,
                property,
            } => write!(f, "Type `{type_name}` has no property `{property}`"),
            TextError::UnknownType { name } => write!(f, "No type is registered as `{name}`"),
            TextError::NoConstructor { type_name } => {
                write!(f, "Type `{type_name}` cannot be default-constructed")
            }
        }
    }
}

impl core::error::Error for TextError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TextError::Reflect(err) => Some(err),
            TextError::Fmt(err) => Some(err),
            TextError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReflectError> for TextError {
    fn from(err: ReflectError) -> Self {
        match err {
            ReflectError::NoConstructor { type_name } => TextError::NoConstructor { type_name },
            err => TextError::Reflect(err),
        }
    }
}

impl From<fmt::Error> for TextError {
    fn from(err: fmt::Error) -> Self {
        TextError::Fmt(err)
    }
}

impl From<std::io::Error> for TextError {
    fn from(err: std::io::Error) -> Self {
        TextError::Io(err)
    }
}
