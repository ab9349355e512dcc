use drift_core::{Attribute, FilePos, LoadError, Pos, RefValue, Resource, TypeCall, Value};

use crate::lexer::{Lexer, Token, TokenKind};

/// Parses a declarative document into a resource tree. The returned
/// resource is an unnamed `document` holding the top-level blocks.
pub fn parse_document(source: &str, file: &str) -> Result<Resource, LoadError> {
    let tokens = Lexer::new(source, file).tokenize()?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        file,
    };
    parser.document()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    cursor: usize,
    file: &'a str,
}

impl Parser<'_> {
    fn document(&mut self) -> Result<Resource, LoadError> {
        let mut document = Resource::new("document");
        while self.peek().is_some() {
            document.children.push(self.block()?);
        }
        Ok(document)
    }

    fn block(&mut self) -> Result<Resource, LoadError> {
        let (kind, pos) = self.expect_ident("block type")?;
        let mut resource = Resource::new(kind);
        resource.pos = Some(pos);

        if let Some(TokenKind::String(name)) = self.peek_kind() {
            resource.name = Some(name.clone());
            self.advance();
        }

        self.expect(&TokenKind::LBrace, "`{`")?;
        while !matches!(self.peek_kind(), Some(TokenKind::RBrace)) {
            let Some(_) = self.peek() else {
                return Err(self.error_at(pos, "unterminated block".to_string()));
            };
            self.body_entry(&mut resource)?;
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(resource)
    }

    fn body_entry(&mut self, resource: &mut Resource) -> Result<(), LoadError> {
        match self.peek_at_kind(1) {
            Some(TokenKind::Equals) => {
                let (key, pos) = self.expect_ident("attribute key")?;
                self.expect(&TokenKind::Equals, "`=`")?;
                let value = self.value()?;
                let mut attribute = Attribute::new(key, value);
                attribute.pos = Some(pos);
                resource.set_attr(attribute);
                Ok(())
            }
            _ => {
                resource.children.push(self.block()?);
                Ok(())
            }
        }
    }

    fn value(&mut self) -> Result<Value, LoadError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.eof_error("a value"));
        };
        match token.kind {
            TokenKind::String(text) => {
                self.advance();
                Ok(Value::string(text))
            }
            TokenKind::Int(value) => {
                self.advance();
                Ok(Value::int(value))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Value::Literal(drift_core::Literal::Float(value)))
            }
            TokenKind::Bool(value) => {
                self.advance();
                Ok(Value::bool(value))
            }
            TokenKind::LBracket => self.list(),
            TokenKind::Ident(_) => self.call_or_ref(),
            other => Err(self.error_at(
                token.pos,
                format!("expected a value, found `{}`", describe(&other)),
            )),
        }
    }

    fn list(&mut self) -> Result<Value, LoadError> {
        self.expect(&TokenKind::LBracket, "`[`")?;
        let mut values = Vec::new();
        loop {
            if matches!(self.peek_kind(), Some(TokenKind::RBracket)) {
                break;
            }
            values.push(self.value()?);
            if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(Value::List(values))
    }

    /// A bare identifier path. A single segment followed by `(` is a type
    /// constructor; anything else is a symbolic reference.
    fn call_or_ref(&mut self) -> Result<Value, LoadError> {
        let (first, _) = self.expect_ident("identifier")?;

        if matches!(self.peek_kind(), Some(TokenKind::LParen)) {
            self.advance();
            let mut args = Vec::new();
            loop {
                if matches!(self.peek_kind(), Some(TokenKind::RParen)) {
                    break;
                }
                args.push(self.value()?);
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(&TokenKind::RParen, "`)`")?;
            return Ok(Value::Type(TypeCall { name: first, args }));
        }

        let mut path = vec![first];
        while matches!(self.peek_kind(), Some(TokenKind::Dot)) {
            self.advance();
            let (segment, _) = self.expect_ident("reference segment")?;
            path.push(segment);
        }
        Ok(Value::Ref(RefValue { path }))
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Pos), LoadError> {
        match self.peek().cloned() {
            Some(Token {
                kind: TokenKind::Ident(text),
                pos,
            }) => {
                self.advance();
                Ok((text, pos))
            }
            Some(token) => Err(self.error_at(
                token.pos,
                format!("expected {what}, found `{}`", describe(&token.kind)),
            )),
            None => Err(self.eof_error(what)),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), LoadError> {
        match self.peek() {
            Some(token) if &token.kind == kind => {
                self.advance();
                Ok(())
            }
            Some(token) => {
                let pos = token.pos;
                let found = describe(&token.kind);
                Err(self.error_at(pos, format!("expected {what}, found `{found}`")))
            }
            None => Err(self.eof_error(what)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn peek_at_kind(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.cursor + ahead).map(|token| &token.kind)
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn error_at(&self, pos: Pos, message: String) -> LoadError {
        LoadError::Syntax {
            message,
            pos: Some(FilePos::new(self.file, pos)),
        }
    }

    fn eof_error(&self, what: &str) -> LoadError {
        let pos = self
            .tokens
            .last()
            .map(|token| token.pos)
            .unwrap_or_default();
        self.error_at(pos, format!("expected {what}, found end of file"))
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(text) => text.clone(),
        TokenKind::String(text) => format!("\"{text}\""),
        TokenKind::Int(value) => value.to_string(),
        TokenKind::Float(value) => value.to_string(),
        TokenKind::Bool(value) => value.to_string(),
        TokenKind::LBrace => "{".to_string(),
        TokenKind::RBrace => "}".to_string(),
        TokenKind::LBracket => "[".to_string(),
        TokenKind::RBracket => "]".to_string(),
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
        TokenKind::Equals => "=".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::Dot => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_blocks_and_values() {
        let doc = parse_document(
            r#"
            schema "public" {}

            table "users" {
              schema = schema.public
              column "id" {
                type = int
                null = false
              }
              column "name" {
                type = varchar(255)
              }
            }
            "#,
            "schema.dft",
        )
        .unwrap();

        assert_eq!(doc.children.len(), 2);
        let table = doc.resource("table", "users").unwrap();
        assert_eq!(
            table.attr("schema").unwrap().value,
            Value::Ref(RefValue::new(["schema", "public"]))
        );
        let column = table.resource("column", "name").unwrap();
        let Value::Type(call) = &column.attr("type").unwrap().value else {
            panic!("expected a type constructor");
        };
        assert_eq!(call.name, "varchar");
        assert_eq!(call.args, vec![Value::int(255)]);
    }

    #[test]
    fn parses_reference_lists() {
        let doc = parse_document(
            r#"
            table "t1" {
              primary_key {
                columns = [column.t1.id, column.t1.org]
              }
            }
            "#,
            "schema.dft",
        )
        .unwrap();

        let pk = &doc.children[0].children[0];
        assert_eq!(pk.kind, "primary_key");
        let list = pk.attr("columns").unwrap().value.as_list().unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn syntax_error_carries_file_position() {
        let err = parse_document("table \"t\" { null = }", "bad.dft").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("bad.dft:1:"), "unexpected message: {text}");
    }
}
