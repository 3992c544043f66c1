use core::fmt;

use super::{SerializeOptions, TextError};
use crate::{ReflectError, Scalar, VarPtr, trace};

/// Writes values in the text format.
///
/// The serializer owns the nesting level, so independent serializers never
/// affect each other's indentation.
pub struct TextSerializer<'w> {
    out: &'w mut dyn fmt::Write,
    options: SerializeOptions,
    depth: usize,
    at_line_start: bool,
}

impl<'w> TextSerializer<'w> {
    /// Creates a serializer writing to `out` with default options.
    pub fn new(out: &'w mut dyn fmt::Write) -> Self {
        Self::with_options(out, SerializeOptions::default())
    }

    /// Creates a serializer writing to `out`.
    pub fn with_options(out: &'w mut dyn fmt::Write, options: SerializeOptions) -> Self {
        Self {
            out,
            options,
            depth: 0,
            at_line_start: true,
        }
    }

    /// Current nesting level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Writes the value behind `var`.
    pub fn serialize(&mut self, var: &VarPtr<'_>) -> Result<(), TextError> {
        if !var.valid() {
            return Err(ReflectError::InvalidHandle.into());
        }
        self.serialize_value(var)
    }

    pub(crate) fn serialize_value(&mut self, var: &VarPtr<'_>) -> Result<(), TextError> {
        let meta = var.type_info();
        match meta.serializer() {
            Some(serialize) => serialize(self, var),
            None => {
                trace!("`{}` has no serializer, writing nothing", meta.name());
                Ok(())
            }
        }
    }

    /// Writes the indentation for the current level.
    pub fn write_indent(&mut self) -> Result<(), TextError> {
        for _ in 0..self.depth {
            self.out.write_str(self.options.indent)?;
        }
        Ok(())
    }

    /// Ends the current line.
    pub fn newline(&mut self) -> Result<(), TextError> {
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// Whether nothing has been written since the last newline.
    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    fn indented(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), TextError>,
    ) -> Result<(), TextError> {
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }
}

impl fmt::Write for TextSerializer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.is_empty() {
            return Ok(());
        }
        self.out.write_str(s)?;
        self.at_line_start = s.ends_with('\n');
        Ok(())
    }
}

/// Serialize routine installed for leaf types.
pub(crate) fn serialize_scalar<T: Scalar>(
    ser: &mut TextSerializer<'_>,
    var: &VarPtr<'_>,
) -> Result<(), TextError> {
    let value = var.try_get::<T>()?;
    value.write_scalar(ser)?;
    Ok(())
}

/// Serialize routine installed for registered structures.
pub(crate) fn serialize_aggregate(
    ser: &mut TextSerializer<'_>,
    var: &VarPtr<'_>,
) -> Result<(), TextError> {
    use fmt::Write as _;

    let meta = var.type_info();
    ser.write_str(meta.name())?;
    ser.newline()?;
    ser.write_indent()?;
    ser.write_str("{")?;
    ser.newline()?;

    ser.indented(|ser| {
        for property in meta.properties() {
            ser.write_indent()?;
            write!(ser, "{} = ", property.name())?;
            let field = var.field(property);
            ser.serialize_value(&field)?;
            if !ser.at_line_start {
                ser.newline()?;
            }
        }
        Ok(())
    })?;

    ser.write_indent()?;
    ser.write_str("}")?;
    ser.newline()
}
