//! Mapper expressions understood by the interpreter
//!
//! ```text
//! expr := term ('+' term)*
//! term := $N | $startN | $endN | text() | start | end | 'str' | "str" | [expr, ...] | ident(expr, ...) | (expr)
//! ```

use thiserror::Error;

/// Parsed mapper expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperExpr {
    /// `$N`: the alternative's N-th capture
    Capture(usize),

    /// `text()`: the text matched by the whole alternative
    Text,

    /// `start`: offset the alternative started at
    Start,

    /// `end`: offset the alternative ended at
    End,

    /// `$startN`: offset the N-th capture started at
    StartOf(usize),

    /// `$endN`: offset the N-th capture ended at
    EndOf(usize),

    /// String constant
    Str(String),

    /// `[a, b, ...]`
    List(Vec<MapperExpr>),

    /// `kind(a, b, ...)`: node built from its arguments
    Node { kind: String, args: Vec<MapperExpr> },

    /// `a + b + ...`
    Concat(Vec<MapperExpr>),
}

impl MapperExpr {
    /// Get the greatest capture index the expression refers to
    pub fn max_capture(&self) -> Option<usize> {
        match self {
            Self::Capture(index) | Self::StartOf(index) | Self::EndOf(index) => Some(*index),
            Self::Text | Self::Start | Self::End | Self::Str(_) => None,
            Self::List(exprs) | Self::Concat(exprs) | Self::Node { args: exprs, .. } => {
                exprs.iter().filter_map(Self::max_capture).max()
            }
        }
    }
}

/// Error raised when parsing a mapper expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at character {offset})")]
pub struct MapperError {
    /// Byte offset in the mapper's code
    pub offset: usize,
    pub message: String,
}

/// Parse a mapper expression
pub fn parse_mapper(code: &str) -> Result<MapperExpr, MapperError> {
    let mut parser = MapperParser { code, pos: 0 };

    let expr = parser.expr()?;
    parser.skip_whitespace();

    if parser.pos < code.len() {
        return Err(parser.error("unexpected trailing content"));
    }

    Ok(expr)
}

struct MapperParser<'a> {
    code: &'a str,
    pos: usize,
}

impl<'a> MapperParser<'a> {
    fn rest(&self) -> &'a str {
        &self.code[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, symbol: char) -> bool {
        self.skip_whitespace();

        if self.peek() == Some(symbol) {
            self.pos += symbol.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: char) -> Result<(), MapperError> {
        if self.eat(symbol) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", symbol)))
        }
    }

    fn error(&self, message: &str) -> MapperError {
        MapperError {
            offset: self.pos,
            message: message.to_owned(),
        }
    }

    fn expr(&mut self) -> Result<MapperExpr, MapperError> {
        let mut terms = vec![self.term()?];

        while self.eat('+') {
            terms.push(self.term()?);
        }

        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            MapperExpr::Concat(terms)
        })
    }

    fn term(&mut self) -> Result<MapperExpr, MapperError> {
        self.skip_whitespace();

        match self.peek() {
            Some('$') => {
                self.pos += 1;

                let make: fn(usize) -> MapperExpr = match self.take_while(|c| c.is_ascii_alphabetic()) {
                    "" => MapperExpr::Capture,
                    "start" => MapperExpr::StartOf,
                    "end" => MapperExpr::EndOf,
                    _ => return Err(self.error("expected a capture index after '$'")),
                };

                let digits = self.take_while(|c| c.is_ascii_digit());

                digits
                    .parse()
                    .map(make)
                    .map_err(|_| self.error("expected a capture index after '$'"))
            }
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                self.string(quote).map(MapperExpr::Str)
            }
            Some('[') => {
                self.pos += 1;
                self.list(']').map(MapperExpr::List)
            }
            Some('(') => {
                self.pos += 1;
                let expr = self.expr()?;
                self.expect(')')?;
                Ok(expr)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.ident_term(),
            Some(_) => Err(self.error("expected an expression")),
            None => Err(self.error("unexpected end of mapper")),
        }
    }

    fn ident_term(&mut self) -> Result<MapperExpr, MapperError> {
        let start = self.pos;
        let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');

        if !self.eat('(') {
            return match ident {
                "start" => Ok(MapperExpr::Start),
                "end" => Ok(MapperExpr::End),
                _ => Err(MapperError {
                    offset: start,
                    message: format!("unknown name '{}'", ident),
                }),
            };
        }

        let args = self.list(')')?;

        if ident == "text" {
            return if args.is_empty() {
                Ok(MapperExpr::Text)
            } else {
                Err(MapperError {
                    offset: start,
                    message: "text() takes no argument".to_owned(),
                })
            };
        }

        Ok(MapperExpr::Node {
            kind: ident.to_owned(),
            args,
        })
    }

    /// Parse comma-separated expressions up to (and including) the closing symbol
    fn list(&mut self, closing: char) -> Result<Vec<MapperExpr>, MapperError> {
        let mut items = vec![];

        if self.eat(closing) {
            return Ok(items);
        }

        loop {
            items.push(self.expr()?);

            if self.eat(closing) {
                return Ok(items);
            }

            self.expect(',')?;
        }
    }

    /// Parse the rest of a string constant, after its opening quote
    fn string(&mut self, quote: char) -> Result<String, MapperError> {
        let mut out = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                c if c == quote => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c => out.push(c),
            }
        }

        Err(self.error("unterminated string"))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }
}
