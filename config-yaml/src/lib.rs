//! A small recursive-descent YAML-subset parser, generalized from the
//! teacher's hand-rolled config lexer/parser pair to back `DaemonConfig`
//! (see `origin-server::config`) instead of the teacher's nested
//! server/route config shape.

pub mod from_yaml;
pub mod lexer;

pub use from_yaml::FromYaml;

use lexer::{LexerError, Loc, Token, Tokenizer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug)]
pub enum YamlError {
    Lexer(LexerError),
    Parse { message: String, loc: Option<Loc> },
    Generic(String),
}

impl fmt::Display for YamlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YamlError::Lexer(e) => write!(f, "{e}"),
            YamlError::Parse { message, loc: Some(loc) } => {
                write!(f, "{message} (at line {}, col {})", loc.line, loc.col)
            }
            YamlError::Parse { message, loc: None } => write!(f, "{message}"),
            YamlError::Generic(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for YamlError {}

impl From<LexerError> for YamlError {
    fn from(e: LexerError) -> Self {
        YamlError::Lexer(e)
    }
}

impl From<String> for YamlError {
    fn from(s: String) -> Self {
        YamlError::Generic(s)
    }
}

#[derive(Debug, Clone)]
pub enum YamlValue<'a> {
    Map(BTreeMap<&'a str, YamlValue<'a>>),
    List(Vec<YamlValue<'a>>),
    Scalar(&'a str),
}

impl<'a> YamlValue<'a> {
    pub fn get(&self, key: &str) -> Option<&YamlValue<'a>> {
        match self {
            YamlValue::Map(m) => m.get(key),
            _ => None,
        }
    }

    pub fn index(&self, i: usize) -> Option<&YamlValue<'a>> {
        match self {
            YamlValue::List(l) => l.get(i),
            _ => None,
        }
    }
}

pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    lookahead: Token<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, YamlError> {
        let mut tokenizer = Tokenizer::new(source);
        let first = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            lookahead: first,
        })
    }

    fn advance(&mut self) -> Result<(), YamlError> {
        self.lookahead = self.tokenizer.next_token()?;
        Ok(())
    }

    fn skip_newlines(&mut self) -> Result<(), YamlError> {
        while matches!(self.lookahead, Token::NewLine) {
            self.advance()?;
        }
        Ok(())
    }

    pub fn parse(&mut self) -> Result<YamlValue<'a>, YamlError> {
        self.skip_newlines()?;
        if let Token::Indent(n) = self.lookahead {
            self.advance()?;
            self.parse_value(n)
        } else {
            self.parse_value(0)
        }
    }

    fn parse_value(&mut self, current_indent: usize) -> Result<YamlValue<'a>, YamlError> {
        self.skip_newlines()?;

        match self.lookahead {
            Token::Indent(n) => {
                if n > current_indent {
                    self.advance()?;
                    if matches!(self.lookahead, Token::Dash) {
                        return self.parse_list(n, current_indent);
                    }
                    return self.parse_value(n);
                }
                Ok(YamlValue::Scalar(""))
            }
            Token::Dash => self.parse_list(current_indent, current_indent),
            Token::OpenBracket => self.parse_bracket_list(),
            Token::OpenBrace => self.parse_brace_map(),
            Token::Identifier(s) => {
                self.advance()?;
                if matches!(self.lookahead, Token::Colon) {
                    self.parse_map(s, current_indent)
                } else {
                    Ok(YamlValue::Scalar(s))
                }
            }
            Token::Scalar(s) => {
                self.advance()?;
                Ok(YamlValue::Scalar(s))
            }
            other => Err(YamlError::Parse {
                message: format!("expected a value, found {other:?}"),
                loc: None,
            }),
        }
    }

    fn parse_list(
        &mut self,
        list_indent: usize,
        parent_indent: usize,
    ) -> Result<YamlValue<'a>, YamlError> {
        let mut items = Vec::new();
        loop {
            if !matches!(self.lookahead, Token::Dash) {
                break;
            }
            self.advance()?;
            items.push(self.parse_value(list_indent + 2)?);
            self.skip_newlines()?;

            match self.lookahead {
                Token::Indent(n) if n == list_indent => {
                    self.advance()?;
                    if !matches!(self.lookahead, Token::Dash) {
                        return Err(YamlError::Parse {
                            message: format!("expected '-' for list item, found {:?}", self.lookahead),
                            loc: None,
                        });
                    }
                }
                Token::Indent(n) if n <= parent_indent => break,
                Token::Indent(n) => {
                    return Err(YamlError::Parse {
                        message: format!(
                            "sequence items must align at column {list_indent}, found {n}"
                        ),
                        loc: None,
                    });
                }
                Token::Dash => continue,
                _ => break,
            }
        }
        Ok(YamlValue::List(items))
    }

    fn parse_bracket_list(&mut self) -> Result<YamlValue<'a>, YamlError> {
        self.advance()?;
        let mut items = Vec::new();
        while !matches!(self.lookahead, Token::CloseBracket | Token::Eof) {
            if matches!(self.lookahead, Token::Indent(_) | Token::NewLine) {
                self.advance()?;
                continue;
            }
            items.push(self.parse_value(0)?);
            if matches!(self.lookahead, Token::Comma) {
                self.advance()?;
                while matches!(self.lookahead, Token::Indent(_) | Token::NewLine) {
                    self.advance()?;
                }
            }
        }
        if !matches!(self.lookahead, Token::CloseBracket) {
            return Err(YamlError::Parse {
                message: "expected closing ']'".into(),
                loc: None,
            });
        }
        self.advance()?;
        Ok(YamlValue::List(items))
    }

    fn parse_brace_map(&mut self) -> Result<YamlValue<'a>, YamlError> {
        self.advance()?;
        let mut map = BTreeMap::new();
        while !matches!(self.lookahead, Token::CloseBrace | Token::Eof) {
            if matches!(self.lookahead, Token::Indent(_) | Token::NewLine) {
                self.advance()?;
                continue;
            }
            let key = match self.lookahead {
                Token::Identifier(s) => {
                    self.advance()?;
                    s
                }
                _ => {
                    return Err(YamlError::Parse {
                        message: "expected identifier".into(),
                        loc: None,
                    });
                }
            };
            if !matches!(self.lookahead, Token::Colon) {
                return Err(YamlError::Parse {
                    message: "expected ':'".into(),
                    loc: None,
                });
            }
            self.advance()?;
            let value = self.parse_value(0)?;
            map.insert(key, value);
            if matches!(self.lookahead, Token::Comma) {
                self.advance()?;
            }
        }
        if !matches!(self.lookahead, Token::CloseBrace) {
            return Err(YamlError::Parse {
                message: "expected closing '}'".into(),
                loc: None,
            });
        }
        self.advance()?;
        Ok(YamlValue::Map(map))
    }

    fn parse_map(
        &mut self,
        first_key: &'a str,
        map_indent: usize,
    ) -> Result<YamlValue<'a>, YamlError> {
        let mut map = BTreeMap::new();
        let mut current_key = first_key;
        loop {
            if !matches!(self.lookahead, Token::Colon) {
                return Err(YamlError::Parse {
                    message: format!("expected ':' after '{current_key}', found {:?}", self.lookahead),
                    loc: None,
                });
            }
            self.advance()?;
            self.skip_newlines()?;

            let value = self.parse_value(map_indent)?;
            if map.insert(current_key, value).is_some() {
                return Err(YamlError::Parse {
                    message: format!("duplicate key: {current_key}"),
                    loc: None,
                });
            }

            self.skip_newlines()?;

            if let Token::Indent(n) = self.lookahead {
                if n == map_indent {
                    self.advance()?;
                    match self.lookahead {
                        Token::Identifier(s) => {
                            current_key = s;
                            self.advance()?;
                            continue;
                        }
                        Token::Eof => break,
                        _ => {
                            return Err(YamlError::Parse {
                                message: format!(
                                    "expected identifier for map key, found {:?}",
                                    self.lookahead
                                ),
                                loc: None,
                            });
                        }
                    }
                }
            }
            break;
        }
        Ok(YamlValue::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_map() {
        let mut p = Parser::new("host: 127.0.0.1\nport: 8080\n").unwrap();
        let v = p.parse().unwrap();
        assert_eq!(v.get("host").unwrap().get("missing"), None);
        match v.get("port").unwrap() {
            YamlValue::Scalar(s) => assert_eq!(*s, "8080"),
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn parses_inline_list() {
        let mut p = Parser::new("ports: [80, 443]\n").unwrap();
        let v = p.parse().unwrap();
        let ports = v.get("ports").unwrap();
        assert_eq!(ports.index(0).unwrap().get("x"), None);
    }

    #[test]
    fn parses_block_list() {
        let mut p = Parser::new("ports:\n  - 80\n  - 443\n").unwrap();
        let v = p.parse().unwrap();
        let ports = v.get("ports").unwrap();
        match ports {
            YamlValue::List(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected list"),
        }
    }
}
