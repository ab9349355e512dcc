use drift_core::{FilePos, LoadError, Pos};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Equals,
    Comma,
    Dot,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

pub(crate) struct Lexer<'a> {
    source: &'a [u8],
    file: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            file,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, LoadError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LoadError> {
        self.skip_trivia();
        let Some(byte) = self.peek() else {
            return Ok(None);
        };
        let pos = self.pos();

        let kind = match byte {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'=' => self.single(TokenKind::Equals),
            b',' => self.single(TokenKind::Comma),
            b'.' => self.single(TokenKind::Dot),
            b'"' => self.string(pos)?,
            b'-' | b'0'..=b'9' => self.number(pos)?,
            byte if is_ident_start(byte) => self.ident(),
            other => {
                return Err(self.error(pos, format!("unexpected character `{}`", other as char)));
            }
        };

        Ok(Some(Token { kind, pos }))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn string(&mut self, pos: Pos) -> Result<TokenKind, LoadError> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(self.error(pos, "unterminated string literal".to_string()));
                }
                Some(b'"') => {
                    self.advance();
                    return Ok(TokenKind::String(value));
                }
                Some(b'\\') => {
                    self.advance();
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.error(pos, "unterminated escape".to_string()))?;
                    value.push(match escaped {
                        b'n' => '\n',
                        b't' => '\t',
                        b'"' => '"',
                        b'\\' => '\\',
                        other => {
                            return Err(self.error(
                                pos,
                                format!("unknown escape `\\{}`", other as char),
                            ));
                        }
                    });
                    self.advance();
                }
                Some(byte) if byte < 0x80 => {
                    value.push(byte as char);
                    self.advance();
                }
                Some(_) => {
                    // Multi-byte UTF-8: copy the whole scalar.
                    let rest = &self.source[self.offset..];
                    let text = std::str::from_utf8(rest)
                        .map_err(|_| self.error(pos, "invalid UTF-8 in string".to_string()))?;
                    let ch = text.chars().next().expect("non-empty remainder");
                    value.push(ch);
                    for _ in 0..ch.len_utf8() {
                        self.advance();
                    }
                }
            }
        }
    }

    fn number(&mut self, pos: Pos) -> Result<TokenKind, LoadError> {
        let start = self.offset;
        if self.peek() == Some(b'-') {
            self.advance();
        }
        let mut is_float = false;
        while let Some(byte) = self.peek() {
            match byte {
                b'0'..=b'9' => self.advance(),
                b'.' if !is_float
                    && matches!(self.peek_at(1), Some(b'0'..=b'9')) =>
                {
                    is_float = true;
                    self.advance();
                }
                b'e' | b'E' if !is_float => {
                    is_float = true;
                    self.advance();
                    if matches!(self.peek(), Some(b'+' | b'-')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.offset])
            .expect("number bytes are ASCII");
        if is_float {
            let value = text
                .parse::<f64>()
                .map_err(|_| self.error(pos, format!("invalid number `{text}`")))?;
            Ok(TokenKind::Float(value))
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| self.error(pos, format!("invalid number `{text}`")))?;
            Ok(TokenKind::Int(value))
        }
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.offset;
        while let Some(byte) = self.peek() {
            if is_ident_continue(byte) {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.source[start..self.offset])
            .expect("identifier bytes are ASCII")
            .to_string();
        match text.as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Ident(text),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.advance(),
                Some(b'#') => self.skip_line(),
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.skip_line(),
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(byte) = self.peek() {
            self.advance();
            if byte == b'\n' {
                return;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.source.get(self.offset + ahead).copied()
    }

    fn advance(&mut self) {
        if let Some(byte) = self.peek() {
            self.offset += 1;
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, pos: Pos, message: String) -> LoadError {
        LoadError::Syntax {
            message,
            pos: Some(FilePos::new(self.file, pos)),
        }
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, "test.dft")
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn tokenizes_block_header() {
        assert_eq!(
            kinds("table \"users\" {"),
            vec![
                TokenKind::Ident("table".into()),
                TokenKind::String("users".into()),
                TokenKind::LBrace,
            ]
        );
    }

    #[test]
    fn tracks_positions_across_lines() {
        let tokens = Lexer::new("a\n  b", "test.dft").tokenize().unwrap();
        assert_eq!(tokens[0].pos, Pos { line: 1, column: 1 });
        assert_eq!(tokens[1].pos, Pos { line: 2, column: 3 });
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            kinds("# heading\nnull = true // tail"),
            vec![
                TokenKind::Ident("null".into()),
                TokenKind::Equals,
                TokenKind::Bool(true),
            ]
        );
    }

    #[test]
    fn numbers_split_int_and_float() {
        assert_eq!(
            kinds("10 -3 2.5"),
            vec![
                TokenKind::Int(10),
                TokenKind::Int(-3),
                TokenKind::Float(2.5),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let err = Lexer::new("name = \"oops", "s.dft").tokenize().unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }
}
