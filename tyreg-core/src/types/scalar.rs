use core::fmt;

use crate::text::{TextError, Tokenizer};

/// A leaf type: written as a single literal instead of a block of properties.
///
/// Implemented for the primitives the registry knows from the start; user
/// types implement it to be registered with
/// [`TypeRegistry::register_scalar`](crate::TypeRegistry::register_scalar) or
/// [`TypeRegistry::register_write_only`](crate::TypeRegistry::register_write_only).
pub trait Scalar: 'static {
    /// Writes the literal form of the value.
    fn write_scalar(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// A leaf type that can also be read back.
pub trait ParseScalar: Scalar + Sized {
    /// Reads one literal from the token stream. `type_name` is the registered
    /// name of the type, for error reporting.
    fn parse_scalar(tokens: &mut Tokenizer<'_>, type_name: &'static str)
    -> Result<Self, TextError>;
}

macro_rules! impl_numeric_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn write_scalar(&self, out: &mut dyn fmt::Write) -> fmt::Result {
                    write!(out, "{self}")
                }
            }

            impl ParseScalar for $ty {
                fn parse_scalar(
                    tokens: &mut Tokenizer<'_>,
                    type_name: &'static str,
                ) -> Result<Self, TextError> {
                    let token = tokens.expect_token(type_name)?;
                    token.parse().map_err(|_| TextError::InvalidLiteral {
                        type_name,
                        token: token.to_string(),
                    })
                }
            }
        )*
    };
}

impl_numeric_scalar!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

impl Scalar for bool {
    fn write_scalar(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(if *self { "true" } else { "false" })
    }
}

impl ParseScalar for bool {
    fn parse_scalar(
        tokens: &mut Tokenizer<'_>,
        type_name: &'static str,
    ) -> Result<Self, TextError> {
        match tokens.expect_token(type_name)? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(TextError::InvalidLiteral {
                type_name,
                token: other.to_string(),
            }),
        }
    }
}

impl Scalar for char {
    fn write_scalar(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_char('\'')?;
        match *self {
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            '\r' => out.write_str("\\r")?,
            '\0' => out.write_str("\\0")?,
            '\\' => out.write_str("\\\\")?,
            '\'' => out.write_str("\\'")?,
            c if c.is_control() => write!(out, "\\u{{{:x}}}", c as u32)?,
            c => out.write_char(c)?,
        }
        out.write_char('\'')
    }
}

impl ParseScalar for char {
    fn parse_scalar(
        tokens: &mut Tokenizer<'_>,
        type_name: &'static str,
    ) -> Result<Self, TextError> {
        tokens.char_literal(type_name)
    }
}

impl Scalar for String {
    fn write_scalar(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "\"{self}\"")
    }
}

impl ParseScalar for String {
    fn parse_scalar(
        tokens: &mut Tokenizer<'_>,
        type_name: &'static str,
    ) -> Result<Self, TextError> {
        tokens.quoted(type_name).map(str::to_string)
    }
}

impl Scalar for &'static str {
    fn write_scalar(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "\"{self}\"")
    }
}
