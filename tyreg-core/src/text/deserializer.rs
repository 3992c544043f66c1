use super::{DeserializeOptions, TextError, Tokenizer};
use crate::{ParseScalar, ReflectError, TypeRegistry, VarPtr, debug, trace};

/// Reads values in the text format.
///
/// A deserializer can read several values in a row from the same input.
pub struct TextDeserializer<'input> {
    tokens: Tokenizer<'input>,
    options: DeserializeOptions,
}

impl<'input> TextDeserializer<'input> {
    /// Creates a lenient deserializer over `input`.
    pub fn new(input: &'input str) -> Self {
        Self::with_options(input, DeserializeOptions::default())
    }

    /// Creates a deserializer over `input`.
    pub fn with_options(input: &'input str, options: DeserializeOptions) -> Self {
        Self {
            tokens: Tokenizer::new(input),
            options,
        }
    }

    /// The underlying token stream.
    pub fn tokens(&mut self) -> &mut Tokenizer<'input> {
        &mut self.tokens
    }

    /// Whether the input is used up.
    pub fn is_eof(&mut self) -> bool {
        self.tokens.is_eof()
    }

    /// Reads one value into the memory behind `var`.
    pub fn deserialize(&mut self, var: &mut VarPtr<'_>) -> Result<(), TextError> {
        if !var.valid() {
            return Err(ReflectError::InvalidHandle.into());
        }
        if !var.is_mutable() {
            return Err(ReflectError::ReadOnly {
                type_name: var.type_info().name(),
            }
            .into());
        }
        self.deserialize_value(var)
    }

    pub(crate) fn deserialize_value(&mut self, var: &mut VarPtr<'_>) -> Result<(), TextError> {
        let meta = var.type_info();
        match (meta.deserializer(), meta.serializer()) {
            (Some(deserialize), _) => deserialize(self, var),
            // write-only: a value was written, so step over it
            (None, Some(_)) => {
                trace!("`{}` cannot be read, skipping its value", meta.name());
                self.tokens.skip_value()
            }
            (None, None) => {
                trace!("`{}` has no routines, nothing to read", meta.name());
                Ok(())
            }
        }
    }
}

/// Deserialize routine installed for leaf types.
pub(crate) fn deserialize_scalar<T: ParseScalar>(
    de: &mut TextDeserializer<'_>,
    var: &mut VarPtr<'_>,
) -> Result<(), TextError> {
    let value = T::parse_scalar(&mut de.tokens, var.type_info().name())?;
    *var.try_get_mut::<T>()? = value;
    Ok(())
}

/// Deserialize routine installed for registered structures.
pub(crate) fn deserialize_aggregate(
    de: &mut TextDeserializer<'_>,
    var: &mut VarPtr<'_>,
) -> Result<(), TextError> {
    let meta = var.type_info();
    let name = de.tokens.expect_token("type name")?;
    if name != meta.name() && !core::ptr::eq(TypeRegistry::global().lookup_name(name), meta) {
        return Err(TextError::TypeMismatch {
            expected: meta.name(),
            found: name.to_string(),
        });
    }
    de.tokens.expect_literal("{")?;

    loop {
        let Some(token) = de.tokens.next_token() else {
            if de.options.strict {
                return Err(TextError::UnexpectedEof { expected: "`}`" });
            }
            trace!("input ended inside `{}`, accepting", meta.name());
            return Ok(());
        };
        if token == "}" {
            return Ok(());
        }

        match meta.property(token) {
            Some(property) => {
                de.tokens.expect_literal("=")?;
                let mut field = var.field_mut(property);
                de.deserialize_value(&mut field)?;
            }
            None if de.options.strict => {
                return Err(TextError::UnknownProperty {
                    type_name: meta.name(),
                    property: token.to_string(),
                });
            }
            None => {
                debug!("skipping unknown property `{}` of `{}`", token, meta.name());
                de.tokens.skip_property_value()?;
            }
        }
    }
}
