//! Lexer (tokenizer) for script source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Block structure is expressed through indentation, so the lexer emits
//! synthetic [`TokenKind::Newline`], [`TokenKind::Indent`] and
//! [`TokenKind::Dedent`] tokens. Newlines inside brackets and after a
//! trailing backslash are joined into one logical line.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Width a tab advances the indentation column to (next multiple of this).
const TAB_WIDTH: usize = 8;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),

    // Identifiers
    Ident(String),

    // Keywords
    Def,
    Async,
    Class,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Break,
    Continue,
    Pass,
    Import,
    From,
    As,
    Global,
    Nonlocal,
    Del,
    Raise,
    Assert,
    Try,
    Except,
    Finally,
    With,
    And,
    Or,
    Not,
    Is,
    TrueKw,
    FalseKw,
    NoneKw,

    // Arithmetic
    Plus,        // +
    Minus,       // -
    Star,        // *
    Slash,       // /
    DoubleSlash, // //
    Percent,     // %
    DoubleStar,  // **

    // Assignment
    Eq,            // =
    PlusEq,        // +=
    MinusEq,       // -=
    StarEq,        // *=
    SlashEq,       // /=
    DoubleSlashEq, // //=
    PercentEq,     // %=
    DoubleStarEq,  // **=

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Colon,     // :
    Dot,       // .
    Arrow,     // ->
    Semicolon, // ;
    At,        // @

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "int literal {}", n),
            TokenKind::Float(x) => write!(f, "float literal {}", x),
            TokenKind::Str(s) => write!(f, "string literal {:?}", s),
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Eof => write!(f, "end of file"),
            other => write!(f, "'{}'", other.text()),
        }
    }
}

impl TokenKind {
    /// Source spelling of keyword and operator tokens.
    fn text(&self) -> &'static str {
        match self {
            TokenKind::Def => "def",
            TokenKind::Async => "async",
            TokenKind::Class => "class",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Pass => "pass",
            TokenKind::Import => "import",
            TokenKind::From => "from",
            TokenKind::As => "as",
            TokenKind::Global => "global",
            TokenKind::Nonlocal => "nonlocal",
            TokenKind::Del => "del",
            TokenKind::Raise => "raise",
            TokenKind::Assert => "assert",
            TokenKind::Try => "try",
            TokenKind::Except => "except",
            TokenKind::Finally => "finally",
            TokenKind::With => "with",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Is => "is",
            TokenKind::TrueKw => "True",
            TokenKind::FalseKw => "False",
            TokenKind::NoneKw => "None",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::DoubleSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::DoubleStar => "**",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::DoubleSlashEq => "//=",
            TokenKind::PercentEq => "%=",
            TokenKind::DoubleStarEq => "**=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Arrow => "->",
            TokenKind::Semicolon => ";",
            TokenKind::At => "@",
            TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::Ident(_)
            | TokenKind::Newline
            | TokenKind::Indent
            | TokenKind::Dedent
            | TokenKind::Eof => "",
        }
    }
}

/// A token together with where it starts and the line it ends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    /// Differs from `location.line` only for triple-quoted strings
    pub end_line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error("Lexer error at line {}, column {}: {message}", location.line, location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for script source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Open bracket depth; newlines are insignificant while non-zero
    nesting: usize,
    /// Indentation columns of the enclosing blocks, innermost last
    indents: Vec<usize>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            nesting: 0,
            indents: vec![0],
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut at_line_start = true;

        loop {
            if at_line_start && self.nesting == 0 {
                let indent = self.measure_indent();
                match self.peek() {
                    None => break,
                    Some('\n') | Some('\r') => {
                        // Blank line
                        self.advance();
                        continue;
                    }
                    Some('#') => {
                        self.skip_comment();
                        continue;
                    }
                    _ => {}
                }
                self.emit_indentation(indent, &mut tokens)?;
                at_line_start = false;
            }

            self.skip_inline_whitespace();

            match self.peek() {
                None => break,
                Some('\n') => {
                    let loc = self.current_location();
                    self.advance();
                    if self.nesting == 0 {
                        if !matches!(
                            tokens.last().map(|t| &t.kind),
                            None | Some(TokenKind::Newline)
                        ) {
                            tokens.push(self.token_at(TokenKind::Newline, loc));
                        }
                        at_line_start = true;
                    }
                }
                Some(_) => {
                    let token = self.next_token()?;
                    tokens.push(token);
                }
            }
        }

        let loc = self.current_location();
        if self.nesting > 0 {
            return Err(LexError {
                message: "Unexpected end of file inside brackets".to_string(),
                location: loc,
            });
        }
        if !matches!(
            tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline)
        ) {
            tokens.push(self.token_at(TokenKind::Newline, loc));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            tokens.push(self.token_at(TokenKind::Dedent, loc));
        }
        tokens.push(self.token_at(TokenKind::Eof, loc));

        Ok(tokens)
    }

    /// Compare `indent` with the enclosing block and emit INDENT/DEDENT tokens
    fn emit_indentation(&mut self, indent: usize, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let loc = self.current_location();
        let current = self.indents.last().copied().unwrap_or(0);

        if indent > current {
            self.indents.push(indent);
            tokens.push(self.token_at(TokenKind::Indent, loc));
            return Ok(());
        }

        while indent < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            tokens.push(self.token_at(TokenKind::Dedent, loc));
        }

        if self.indents.last().copied().unwrap_or(0) != indent {
            return Err(LexError {
                message: "Unindent does not match any outer indentation level".to_string(),
                location: loc,
            });
        }

        Ok(())
    }

    /// Consume leading blanks of a physical line and return its indentation column
    fn measure_indent(&mut self) -> usize {
        let mut width = 0;
        loop {
            match self.peek() {
                Some(' ') => width += 1,
                Some('\t') => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                Some('\x0c') => width = 0,
                _ => break,
            }
            self.advance();
        }
        width
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        let kind = match ch {
            // String literals
            '"' | '\'' => self.string_literal(ch, loc)?,

            // Numeric literals
            '0'..='9' => self.number_literal(ch, loc)?,

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => self.identifier_or_keyword(c),

            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::MinusEq)
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    self.with_eq(TokenKind::DoubleStar, TokenKind::DoubleStarEq)
                } else {
                    self.with_eq(TokenKind::Star, TokenKind::StarEq)
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    self.with_eq(TokenKind::DoubleSlash, TokenKind::DoubleSlashEq)
                } else {
                    self.with_eq(TokenKind::Slash, TokenKind::SlashEq)
                }
            }
            '%' => self.with_eq(TokenKind::Percent, TokenKind::PercentEq),
            '=' => self.with_eq(TokenKind::Eq, TokenKind::EqEq),
            '<' => self.with_eq(TokenKind::Lt, TokenKind::Le),
            '>' => self.with_eq(TokenKind::Gt, TokenKind::Ge),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexError {
                        message: "Unexpected character: '!'".to_string(),
                        location: loc,
                    });
                }
            }
            '(' => {
                self.nesting += 1;
                TokenKind::LParen
            }
            '[' => {
                self.nesting += 1;
                TokenKind::LBracket
            }
            ')' | ']' => {
                if self.nesting == 0 {
                    return Err(LexError {
                        message: format!("Unmatched '{}'", ch),
                        location: loc,
                    });
                }
                self.nesting -= 1;
                if ch == ')' {
                    TokenKind::RParen
                } else {
                    TokenKind::RBracket
                }
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            '@' => TokenKind::At,

            _ => {
                return Err(LexError {
                    message: format!("Unexpected character: '{}'", ch),
                    location: loc,
                });
            }
        };

        Ok(self.token_at(kind, loc))
    }

    /// `plain` unless the next character is '=', in which case `with_eq`
    fn with_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// Parse string literal (opening quote already consumed)
    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Result<TokenKind, LexError> {
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut string = String::new();

        loop {
            let ch = match self.peek() {
                Some(ch) => ch,
                None => break,
            };

            if ch == quote {
                if !triple {
                    self.advance();
                    return Ok(TokenKind::Str(string));
                }
                if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    return Ok(TokenKind::Str(string));
                }
                string.push(ch);
                self.advance();
                continue;
            }

            if ch == '\n' && !triple {
                break;
            }

            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "Unexpected end of file in string literal".to_string(),
                    location: self.current_location(),
                })?;

                match escaped {
                    'n' => string.push('\n'),
                    't' => string.push('\t'),
                    'r' => string.push('\r'),
                    '0' => string.push('\0'),
                    '\\' => string.push('\\'),
                    '\'' => string.push('\''),
                    '"' => string.push('"'),
                    '\n' => {} // line continuation inside the literal
                    other => {
                        // Unknown escapes are kept verbatim
                        string.push('\\');
                        string.push(other);
                    }
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse numeric literal (integers and decimal floats)
    fn number_literal(
        &mut self,
        first_digit: char,
        loc: SourceLocation,
    ) -> Result<TokenKind, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);
        let mut is_float = false;

        self.take_digits(&mut num_str);

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            num_str.push('.');
            self.advance();
            self.take_digits(&mut num_str);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_offset = usize::from(matches!(self.peek_ahead(1), Some('+') | Some('-')));
            if self
                .peek_ahead(1 + sign_offset)
                .is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                num_str.push('e');
                self.advance();
                if sign_offset == 1 {
                    if let Some(sign) = self.advance() {
                        num_str.push(sign);
                    }
                }
                self.take_digits(&mut num_str);
            }
        }

        if is_float {
            let value = num_str.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid float literal: {}", num_str),
                location: loc,
            })?;
            return Ok(TokenKind::Float(value));
        }

        let value = num_str.parse::<i64>().map_err(|_| LexError {
            message: format!("Integer literal out of range: {}", num_str),
            location: loc,
        })?;

        Ok(TokenKind::Int(value))
    }

    /// Append ASCII digits (skipping `_` separators) to `out`
    fn take_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
            } else if ch != '_' {
                break;
            }
            self.advance();
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char) -> TokenKind {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "def" => TokenKind::Def,
            "async" => TokenKind::Async,
            "class" => TokenKind::Class,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "pass" => TokenKind::Pass,
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            "global" => TokenKind::Global,
            "nonlocal" => TokenKind::Nonlocal,
            "del" => TokenKind::Del,
            "raise" => TokenKind::Raise,
            "assert" => TokenKind::Assert,
            "try" => TokenKind::Try,
            "except" => TokenKind::Except,
            "finally" => TokenKind::Finally,
            "with" => TokenKind::With,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "is" => TokenKind::Is,
            "True" => TokenKind::TrueKw,
            "False" => TokenKind::FalseKw,
            "None" => TokenKind::NoneKw,
            _ => TokenKind::Ident(ident),
        }
    }

    /// Skip blanks, comments and backslash continuations within a line
    fn skip_inline_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\x0c') => {
                    self.advance();
                }
                Some('\\') if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                Some('\\')
                    if self.peek_ahead(1) == Some('\r') && self.peek_ahead(2) == Some('\n') =>
                {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                Some('#') => self.skip_comment(),
                _ => break,
            }
        }
    }

    /// Skip a `#` comment up to (not including) the newline
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn token_at(&self, kind: TokenKind, location: SourceLocation) -> Token {
        Token {
            kind,
            location,
            end_line: self.line.max(location.line),
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("x = 1 + 2\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Eq,
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = kinds("if x:\n    y = 1\nz = 2");
        assert_eq!(
            tokens,
            vec![
                TokenKind::If,
                TokenKind::Ident("x".to_string()),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Ident("y".to_string()),
                TokenKind::Eq,
                TokenKind::Int(1),
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Ident("z".to_string()),
                TokenKind::Eq,
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dedents_closed_at_eof() {
        let tokens = kinds("def f():\n    if x:\n        pass\n");
        let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("a // b ** c -> d != e <= f //= g");
        assert!(tokens.contains(&TokenKind::DoubleSlash));
        assert!(tokens.contains(&TokenKind::DoubleStar));
        assert!(tokens.contains(&TokenKind::Arrow));
        assert!(tokens.contains(&TokenKind::NotEq));
        assert!(tokens.contains(&TokenKind::Le));
        assert!(tokens.contains(&TokenKind::DoubleSlashEq));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let tokens = kinds("# header\n\nx = 1  # trailing\n    # odd indent comment\ny = 2\n");
        let newlines = tokens.iter().filter(|k| **k == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_brackets_join_lines() {
        let tokens = kinds("x = [1,\n     2]\n");
        let newlines = tokens.iter().filter(|k| **k == TokenKind::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let tokens = Lexer::new("def f():\n    \"\"\"\n    doc\n    \"\"\"\n    return 1\n")
            .tokenize()
            .unwrap();
        let doc = tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Str(_)))
            .unwrap();
        assert_eq!(doc.location.line, 2);
        assert_eq!(doc.end_line, 4);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#"'it\'s\n' "a\qb""#);
        assert_eq!(tokens[0], TokenKind::Str("it's\n".to_string()));
        assert_eq!(tokens[1], TokenKind::Str("a\\qb".to_string()));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("1_000 2.5 3e2");
        assert_eq!(tokens[0], TokenKind::Int(1000));
        assert_eq!(tokens[1], TokenKind::Float(2.5));
        assert_eq!(tokens[2], TokenKind::Float(300.0));
    }

    #[test]
    fn test_bad_unindent() {
        let err = Lexer::new("if x:\n        a = 1\n    b = 2\n")
            .tokenize()
            .unwrap_err();
        assert_eq!(err.location.line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("x = 'abc\n").tokenize().is_err());
    }
}
