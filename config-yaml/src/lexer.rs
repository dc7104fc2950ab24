//! Hand-rolled tokenizer for the indentation-sensitive YAML subset `config-yaml`
//! understands. Deliberately small: block maps, block/inline lists, scalars,
//! inline `{..}`/`[..]` and a `#` comment-to-end-of-line. No anchors, no
//! multi-document streams, no quoted-string escapes beyond a plain `"..."`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Indent(usize),
    NewLine,
    Dash,
    Colon,
    Comma,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Identifier(&'a str),
    Scalar(&'a str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexerError {
    pub message: String,
    pub loc: Loc,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lexer error at line {}, col {}: {}",
            self.loc.line, self.loc.col, self.message
        )
    }
}

impl std::error::Error for LexerError {}

pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    at_line_start: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 1,
            at_line_start: true,
        }
    }

    fn loc(&self) -> Loc {
        Loc {
            line: self.line,
            col: self.col,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consumes a run of spaces at the start of a line and returns its width,
    /// or `None` if the line is blank/comment-only (callers should skip it).
    fn measure_indent(&mut self) -> Option<usize> {
        let mut width = 0;
        loop {
            match self.peek_char() {
                Some(' ') => {
                    self.bump();
                    width += 1;
                }
                Some('\t') => {
                    self.bump();
                    width += 1;
                }
                Some('\n') => {
                    self.bump();
                    continue;
                }
                Some('#') => {
                    while !matches!(self.peek_char(), Some('\n') | None) {
                        self.bump();
                    }
                    continue;
                }
                None => return None,
                _ => return Some(width),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, LexerError> {
        if self.at_line_start {
            match self.measure_indent() {
                Some(width) => {
                    self.at_line_start = false;
                    return Ok(Token::Indent(width));
                }
                None => return Ok(Token::Eof),
            }
        }

        while matches!(self.peek_char(), Some(' ') | Some('\t')) {
            self.bump();
        }
        if self.peek_char() == Some('#') {
            while !matches!(self.peek_char(), Some('\n') | None) {
                self.bump();
            }
        }

        let Some(ch) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        if ch == '\n' {
            self.bump();
            self.at_line_start = true;
            return Ok(Token::NewLine);
        }

        if ch == '"' {
            return self.read_quoted();
        }

        match ch {
            '-' if self.next_is_boundary_after_dash() => {
                self.bump();
                Ok(Token::Dash)
            }
            ':' => {
                self.bump();
                Ok(Token::Colon)
            }
            ',' => {
                self.bump();
                Ok(Token::Comma)
            }
            '[' => {
                self.bump();
                Ok(Token::OpenBracket)
            }
            ']' => {
                self.bump();
                Ok(Token::CloseBracket)
            }
            '{' => {
                self.bump();
                Ok(Token::OpenBrace)
            }
            '}' => {
                self.bump();
                Ok(Token::CloseBrace)
            }
            _ => self.read_bareword(),
        }
    }

    fn next_is_boundary_after_dash(&self) -> bool {
        matches!(
            self.source[self.pos + 1..].chars().next(),
            None | Some(' ') | Some('\t') | Some('\n')
        )
    }

    fn read_quoted(&mut self) -> Result<Token<'a>, LexerError> {
        let loc = self.loc();
        self.bump(); // opening quote
        let start = self.pos;
        loop {
            match self.bump() {
                Some('"') => break,
                Some(_) => continue,
                None => {
                    return Err(LexerError {
                        message: "unterminated quoted scalar".into(),
                        loc,
                    });
                }
            }
        }
        let text = &self.source[start..self.pos - 1];
        Ok(Token::Scalar(text))
    }

    fn read_bareword(&mut self) -> Result<Token<'a>, LexerError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '\n' || c == ':' || c == ',' || c == '#' || c == '[' || c == ']' || c == '{' || c == '}' {
                break;
            }
            self.bump();
        }
        let raw = &self.source[start..self.pos];
        let trimmed = raw.trim_end();
        if trimmed.is_empty() {
            return Err(LexerError {
                message: "unexpected empty token".into(),
                loc: self.loc(),
            });
        }
        // A bareword followed immediately by ':' at the top of a map entry is an
        // Identifier; standalone it's a scalar. The parser disambiguates by
        // lookahead, so we hand back Identifier whenever it looks like one
        // (no embedded spaces) and Scalar otherwise (e.g. "text with spaces").
        if trimmed.contains(' ') {
            Ok(Token::Scalar(trimmed))
        } else {
            Ok(Token::Identifier(trimmed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token<'_>> {
        let mut t = Tokenizer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = t.next_token().unwrap();
            let done = tok == Token::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn tokenizes_simple_map() {
        let toks = lex_all("port: 8080\n");
        assert_eq!(
            toks,
            vec![
                Token::Indent(0),
                Token::Identifier("port"),
                Token::Colon,
                Token::Scalar("8080"),
                Token::NewLine,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_list_dash() {
        let toks = lex_all("ports:\n  - 80\n  - 443\n");
        assert!(toks.contains(&Token::Dash));
        assert!(toks.contains(&Token::Scalar("80")));
    }
}
