use super::TextError;

/// Splits text input into whitespace-delimited tokens.
///
/// Quoted literals are the exception: [`Tokenizer::quoted`] reads from an
/// opening `"` to the next `"` and [`Tokenizer::char_literal`] reads one
/// `'`-quoted character, whitespace included in both.
#[derive(Debug, Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    /// Creates a tokenizer at the start of `input`.
    pub fn new(input: &'input str) -> Self {
        Self { input, pos: 0 }
    }

    /// The input not consumed yet.
    pub fn remaining(&self) -> &'input str {
        &self.input[self.pos..]
    }

    /// Byte position in the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether only whitespace is left.
    pub fn is_eof(&mut self) -> bool {
        self.skip_whitespace();
        self.pos == self.input.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Option<&'input str> {
        self.skip_whitespace();
        let rest = self.remaining();
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&self) -> Option<&'input str> {
        let mut ahead = self.clone();
        ahead.next_token()
    }

    /// Consumes the next token, failing at end of input.
    pub fn expect_token(&mut self, expected: &'static str) -> Result<&'input str, TextError> {
        self.next_token()
            .ok_or(TextError::UnexpectedEof { expected })
    }

    /// Consumes the next token and checks that it is `literal`.
    pub fn expect_literal(&mut self, literal: &'static str) -> Result<(), TextError> {
        let found = self.expect_token(literal)?;
        if found == literal {
            Ok(())
        } else {
            Err(TextError::ExpectedToken {
                expected: literal,
                found: found.to_string(),
            })
        }
    }

    /// Reads a `'`-delimited character literal. Inside the quotes `\n`, `\t`,
    /// `\r`, `\0`, `\\`, `\'` and `\u{hex}` are escapes; anything else,
    /// whitespace included, stands for itself.
    pub fn char_literal(&mut self, expected: &'static str) -> Result<char, TextError> {
        self.skip_whitespace();
        let rest = self.remaining();
        let Some(body) = rest.strip_prefix('\'') else {
            return match self.peek_token() {
                Some(found) => Err(TextError::ExpectedToken {
                    expected: "'",
                    found: found.to_string(),
                }),
                None => Err(TextError::UnexpectedEof { expected }),
            };
        };
        let invalid = || TextError::InvalidLiteral {
            type_name: expected,
            token: rest.split_whitespace().next().unwrap_or(rest).to_string(),
        };
        let Some((value, len)) = unescape_char(body) else {
            if body.is_empty() {
                return Err(TextError::UnexpectedEof { expected });
            }
            return Err(invalid());
        };
        if !body[len..].starts_with('\'') {
            return Err(invalid());
        }
        self.pos += 1 + len + 1;
        Ok(value)
    }

    /// Reads a `"`-delimited string and returns what is between the quotes.
    /// There are no escapes: the string ends at the next `"`.
    pub fn quoted(&mut self, expected: &'static str) -> Result<&'input str, TextError> {
        self.skip_whitespace();
        let rest = self.remaining();
        let Some(body) = rest.strip_prefix('"') else {
            return match self.peek_token() {
                Some(found) => Err(TextError::ExpectedToken {
                    expected: "\"",
                    found: found.to_string(),
                }),
                None => Err(TextError::UnexpectedEof { expected }),
            };
        };
        let Some(end) = body.find('"') else {
            self.pos = self.input.len();
            return Err(TextError::UnexpectedEof { expected: "`\"`" });
        };
        self.pos += 1 + end + 1;
        Ok(&body[..end])
    }

    /// Skips what follows an unknown property name: `=` and then a value (see
    /// [`Tokenizer::skip_value`]). Without the `=`, nothing is skipped.
    pub fn skip_property_value(&mut self) -> Result<(), TextError> {
        if self.peek_token() != Some("=") {
            return Ok(());
        }
        self.next_token();
        self.skip_value()
    }

    /// Skips one value: a quoted string, a single token, or a type name
    /// followed by a `{ ... }` block.
    pub fn skip_value(&mut self) -> Result<(), TextError> {
        if self.skip_quoted()? {
            return Ok(());
        }
        if self.next_token().is_none() {
            return Ok(());
        }
        if self.peek_token() == Some("{") {
            self.skip_block()?;
        }
        Ok(())
    }

    /// Skips a string or character literal if one comes next.
    fn skip_quoted(&mut self) -> Result<bool, TextError> {
        self.skip_whitespace();
        let rest = self.remaining();
        if rest.starts_with('"') {
            self.quoted("string")?;
        } else if rest.starts_with('\'') {
            self.char_literal("char")?;
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// Skips a `{ ... }` block, nested blocks and quoted strings included.
    /// A block cut short by the end of input is skipped up to the end.
    fn skip_block(&mut self) -> Result<(), TextError> {
        let mut depth = 0usize;
        loop {
            if self.skip_quoted()? {
                continue;
            }
            match self.next_token() {
                None => return Ok(()),
                Some("{") => depth += 1,
                Some("}") => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }
}

/// The character at the start of `body` and its length in bytes, escapes
/// resolved.
fn unescape_char(body: &str) -> Option<(char, usize)> {
    let mut chars = body.chars();
    let first = chars.next()?;
    if first != '\\' {
        return Some((first, first.len_utf8()));
    }
    let value = match chars.next()? {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' => '\\',
        '\'' => '\'',
        'u' => {
            let hex = body[2..].strip_prefix('{')?;
            let end = hex.find('}')?;
            let value = u32::from_str_radix(&hex[..end], 16).ok()?;
            return Some((char::from_u32(value)?, 2 + 1 + end + 1));
        }
        _ => return None,
    };
    Some((value, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tyreg_testhelpers::test;

    #[test]
    fn splits_on_spaces_and_newlines() {
        let mut tokens = Tokenizer::new("Point\n{\n  x = 3\n}\n");
        let all: Vec<_> = core::iter::from_fn(|| tokens.next_token()).collect();
        assert_eq!(all, ["Point", "{", "x", "=", "3", "}"]);
        assert!(tokens.is_eof());
        assert_eq!(tokens.position(), "Point\n{\n  x = 3\n}\n".len());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut tokens = Tokenizer::new("a b");
        assert_eq!(tokens.peek_token(), Some("a"));
        assert_eq!(tokens.next_token(), Some("a"));
        assert_eq!(tokens.next_token(), Some("b"));
        assert_eq!(tokens.peek_token(), None);
    }

    #[test]
    fn expect_literal_reports_what_it_found() {
        let mut tokens = Tokenizer::new("(");
        let err = tokens.expect_literal("{").unwrap_err();
        assert!(matches!(err, TextError::ExpectedToken { expected: "{", .. }));
        assert!(matches!(
            tokens.expect_literal("{"),
            Err(TextError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn unterminated_string_is_eof() {
        let mut tokens = Tokenizer::new("\"never closed");
        assert!(matches!(
            tokens.quoted("String"),
            Err(TextError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn skips_scalar_string_and_block_values() {
        let mut tokens = Tokenizer::new("= 5 next");
        tokens.skip_property_value().unwrap();
        assert_eq!(tokens.next_token(), Some("next"));

        let mut tokens = Tokenizer::new("= \"a { b\" next");
        tokens.skip_property_value().unwrap();
        assert_eq!(tokens.next_token(), Some("next"));

        let mut tokens = Tokenizer::new(indoc! {r#"
            = Inner
            {
              a = Deep
              {
              }
              s = "}"
            }
            next
        "#});
        tokens.skip_property_value().unwrap();
        assert_eq!(tokens.next_token(), Some("next"));
    }

    #[test]
    fn char_literals_keep_whitespace_and_escapes() {
        let mut tokens = Tokenizer::new("' ' '\\n' '\\'' '\\u{e9}' 'é' next");
        assert_eq!(tokens.char_literal("char").unwrap(), ' ');
        assert_eq!(tokens.char_literal("char").unwrap(), '\n');
        assert_eq!(tokens.char_literal("char").unwrap(), '\'');
        assert_eq!(tokens.char_literal("char").unwrap(), 'é');
        assert_eq!(tokens.char_literal("char").unwrap(), 'é');
        assert_eq!(tokens.next_token(), Some("next"));
    }

    #[test]
    fn malformed_char_literals() {
        assert!(matches!(
            Tokenizer::new("x").char_literal("char"),
            Err(TextError::ExpectedToken { expected: "'", .. })
        ));
        assert!(matches!(
            Tokenizer::new("'ab'").char_literal("char"),
            Err(TextError::InvalidLiteral { type_name: "char", .. })
        ));
        assert!(matches!(
            Tokenizer::new("'\\q'").char_literal("char"),
            Err(TextError::InvalidLiteral { type_name: "char", .. })
        ));
        assert!(matches!(
            Tokenizer::new("'").char_literal("char"),
            Err(TextError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn skipping_steps_over_char_literals() {
        let mut tokens = Tokenizer::new("= ' ' next");
        tokens.skip_property_value().unwrap();
        assert_eq!(tokens.next_token(), Some("next"));

        let mut tokens = Tokenizer::new("= Inner { c = '}' } next");
        tokens.skip_property_value().unwrap();
        assert_eq!(tokens.next_token(), Some("next"));
    }

    #[test]
    fn name_without_value_skips_nothing() {
        let mut tokens = Tokenizer::new("other = 1");
        tokens.skip_property_value().unwrap();
        assert_eq!(tokens.next_token(), Some("other"));
    }
}
