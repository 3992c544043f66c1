//! The indentation-based text format.
//!
//! A registered structure is written as its type name, then a brace-delimited
//! block with one `name = value` line per property:
//!
//! ```text
//! Point
//! {
//!   x = 3
//!   y = 4
//! }
//! ```
//!
//! Nested structures put their type name after the `=` and open their own
//! block one level deeper. Leaves are written as literals: numbers as Rust
//! prints them, `true`/`false`, characters between `'` with Rust-style
//! escapes for control characters, strings between `"` with no escaping.
//!
//! Reading splits the input on whitespace, so any layout that keeps the
//! tokens apart is accepted.

mod deserializer;
mod error;
mod options;
mod serializer;
mod tokenizer;

pub use deserializer::TextDeserializer;
pub(crate) use deserializer::{deserialize_aggregate, deserialize_scalar};
pub use error::TextError;
pub use options::{DeserializeOptions, SerializeOptions};
pub use serializer::TextSerializer;
pub(crate) use serializer::{serialize_aggregate, serialize_scalar};
pub use tokenizer::Tokenizer;

use core::fmt;
use std::io;

use crate::{OwnedVar, TypeKind, TypeRegistry, VarPtr};

/// Writes the value behind `var` to a `String`.
pub fn to_string(var: &VarPtr<'_>) -> Result<String, TextError> {
    to_string_with_options(var, SerializeOptions::default())
}

/// Writes the value behind `var` to a `String` with custom options.
pub fn to_string_with_options(
    var: &VarPtr<'_>,
    options: SerializeOptions,
) -> Result<String, TextError> {
    let mut out = String::new();
    to_writer_with_options(var, &mut out, options)?;
    Ok(out)
}

/// Writes the value behind `var` to any `fmt::Write`.
pub fn to_writer(var: &VarPtr<'_>, out: &mut dyn fmt::Write) -> Result<(), TextError> {
    to_writer_with_options(var, out, SerializeOptions::default())
}

/// Writes the value behind `var` to any `fmt::Write` with custom options.
pub fn to_writer_with_options(
    var: &VarPtr<'_>,
    out: &mut dyn fmt::Write,
    options: SerializeOptions,
) -> Result<(), TextError> {
    TextSerializer::with_options(out, options).serialize(var)
}

/// Writes the value behind `var` to any `io::Write`.
pub fn to_io_writer<W: io::Write>(var: &VarPtr<'_>, mut writer: W) -> Result<(), TextError> {
    let text = to_string(var)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Reads a value from `input` into the memory behind `var`.
pub fn from_str(input: &str, var: &mut VarPtr<'_>) -> Result<(), TextError> {
    from_str_with_options(input, var, DeserializeOptions::default())
}

/// Reads a value from `input` into the memory behind `var` with custom options.
pub fn from_str_with_options(
    input: &str,
    var: &mut VarPtr<'_>,
    options: DeserializeOptions,
) -> Result<(), TextError> {
    TextDeserializer::with_options(input, options).deserialize(var)
}

/// Reads a value from an `io::Read` into the memory behind `var`.
pub fn from_reader<R: io::Read>(mut reader: R, var: &mut VarPtr<'_>) -> Result<(), TextError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    from_str(&input, var)
}

/// Reads a value whose type is only known from the input.
///
/// The leading type name is resolved through the registry, a default value of
/// that type is constructed and then filled from the input.
///
/// ```
/// # use tyreg_core::text;
/// let owned = text::from_str_dynamic("i32 42").unwrap();
/// assert_eq!(owned.type_info().name(), "i32");
/// assert_eq!(*owned.as_var().get::<i32>(), 42);
/// ```
pub fn from_str_dynamic(input: &str) -> Result<OwnedVar, TextError> {
    from_str_dynamic_with_options(input, DeserializeOptions::default())
}

/// Like [`from_str_dynamic`], with custom options.
pub fn from_str_dynamic_with_options(
    input: &str,
    options: DeserializeOptions,
) -> Result<OwnedVar, TextError> {
    let mut de = TextDeserializer::with_options(input, options);
    let name = de
        .tokens()
        .peek_token()
        .ok_or(TextError::UnexpectedEof {
            expected: "type name",
        })?;
    let meta = TypeRegistry::global().lookup_name(name);
    if !meta.valid() {
        return Err(TextError::UnknownType {
            name: name.to_string(),
        });
    }

    let mut owned = OwnedVar::new(meta)?;
    // leaves carry no type name in the text, so it is consumed here
    if meta.kind() == TypeKind::Scalar {
        de.tokens().next_token();
    }
    de.deserialize(&mut owned.as_var_mut())?;
    Ok(owned)
}

impl From<TextError> for fmt::Error {
    fn from(_: TextError) -> Self {
        fmt::Error
    }
}
