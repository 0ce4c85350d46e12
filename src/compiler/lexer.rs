//! Lexical Analysis
//!
//! Compiler pass that tokenizes Tack source code. Tokens are produced on
//! demand with a one-token lookahead; the parser drives the lexer rather
//! than the whole unit being tokenized up front, so the first error in
//! source order is the first error reported.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{LexError, Position};

/// Reserved words of the Tack language.
///
/// `int`, `bool`, `ptr`, `long` and `str` double as type names in function
/// signatures and as cast operations in function bodies.
const KEYWORDS: [(&str, TokenKind); 20] = [
    ("do", TokenKind::Do),
    ("end", TokenKind::End),
    ("func", TokenKind::Func),
    ("const", TokenKind::Const),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("extern", TokenKind::Extern),
    ("include", TokenKind::Include),
    ("not", TokenKind::Not),
    ("neg", TokenKind::Neg),
    ("dup", TokenKind::Dup),
    ("drop", TokenKind::Drop),
    ("swap", TokenKind::Swap),
    ("rot", TokenKind::Rot),
    ("over", TokenKind::Over),
    ("int", TokenKind::Int),
    ("bool", TokenKind::Bool),
    ("ptr", TokenKind::Ptr),
    ("long", TokenKind::Long),
    ("str", TokenKind::Str),
];

/// Types of lexical elements.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum TokenKind {
    Ident(String),
    Number(i64),
    StrLit(String),
    /// `->`, separating argument types from return types.
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,
    BwAnd,
    BwOr,
    Lsh,
    Rsh,
    Do,
    End,
    Func,
    Const,
    If,
    Else,
    Extern,
    Include,
    Not,
    Neg,
    Dup,
    Drop,
    Swap,
    Rot,
    Over,
    Int,
    Bool,
    Ptr,
    Long,
    Str,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Number(v) => write!(f, "number '{v}'"),
            TokenKind::StrLit(s) => write!(f, "string \"{s}\""),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Lte => write!(f, "'<='"),
            TokenKind::Gte => write!(f, "'>='"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Neq => write!(f, "'!='"),
            TokenKind::BwAnd => write!(f, "'&'"),
            TokenKind::BwOr => write!(f, "'|'"),
            TokenKind::Lsh => write!(f, "'<<'"),
            TokenKind::Rsh => write!(f, "'>>'"),
            TokenKind::Do => write!(f, "'do'"),
            TokenKind::End => write!(f, "'end'"),
            TokenKind::Func => write!(f, "'func'"),
            TokenKind::Const => write!(f, "'const'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::Extern => write!(f, "'extern'"),
            TokenKind::Include => write!(f, "'include'"),
            TokenKind::Not => write!(f, "'not'"),
            TokenKind::Neg => write!(f, "'neg'"),
            TokenKind::Dup => write!(f, "'dup'"),
            TokenKind::Drop => write!(f, "'drop'"),
            TokenKind::Swap => write!(f, "'swap'"),
            TokenKind::Rot => write!(f, "'rot'"),
            TokenKind::Over => write!(f, "'over'"),
            TokenKind::Int => write!(f, "'int'"),
            TokenKind::Bool => write!(f, "'bool'"),
            TokenKind::Ptr => write!(f, "'ptr'"),
            TokenKind::Long => write!(f, "'long'"),
            TokenKind::Str => write!(f, "'str'"),
        }
    }
}

/// Minimal lexical element of a Tack translation unit.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

/// On-demand tokenizer over the bytes of one source file.
#[derive(Debug)]
pub struct Lexer<'a> {
    src: &'a [u8],
    cur: usize,
    // 1-based line, 0-based column within the line. The column advances
    // once per consumed byte and resets on '\n'.
    line: usize,
    column: usize,
    file: Rc<PathBuf>,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Returns a new `Lexer` over `src`, reporting positions against `file`.
    pub fn new(file: Rc<PathBuf>, src: &'a [u8]) -> Self {
        Self {
            src,
            cur: 0,
            line: 1,
            column: 0,
            file,
            peeked: None,
        }
    }

    /// Returns the next token without consuming it, or `None` at the end of
    /// input.
    pub fn peek(&mut self) -> Result<Option<&Token>, LexError> {
        if self.peeked.is_none() {
            self.peeked = self.scan_token()?;
        }

        Ok(self.peeked.as_ref())
    }

    /// Consumes and returns the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }

        self.scan_token()
    }

    /// The position just past the last consumed byte. Used for end-of-file
    /// diagnostics.
    pub fn position(&self) -> Position {
        Position {
            file: Rc::clone(&self.file),
            line: self.line,
            column: self.column,
        }
    }

    fn scan_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia();

        if !self.has_next() {
            return Ok(None);
        }

        let pos = self.position();

        let kind = match self.first() {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = self.cur;

                while self.has_next() && is_ident_continue(self.first()) {
                    self.advance();
                }

                let lexeme = std::str::from_utf8(&self.src[start..self.cur])
                    .expect("identifier bytes are ASCII");

                match KEYWORDS.iter().find(|(word, _)| *word == lexeme) {
                    Some((_, kind)) => kind.clone(),
                    None => TokenKind::Ident(lexeme.into()),
                }
            }
            b'0'..=b'9' => {
                let start = self.cur;

                while self.has_next() && self.first().is_ascii_digit() {
                    self.advance();
                }

                let lexeme = std::str::from_utf8(&self.src[start..self.cur])
                    .expect("digit bytes are ASCII");

                let value = lexeme.parse::<i64>().map_err(|_| LexError::InvalidInteger {
                    lexeme: lexeme.into(),
                    pos: pos.clone(),
                })?;

                TokenKind::Number(value)
            }
            b'"' => {
                self.advance();
                let start = self.cur;

                while self.has_next() && self.first() != b'"' {
                    self.advance();
                }

                if !self.has_next() {
                    return Err(LexError::UnterminatedString { pos });
                }

                // The bytes between the quotes are taken verbatim; there is
                // no escape processing.
                let value = std::str::from_utf8(&self.src[start..self.cur])
                    .expect("source is valid UTF-8 and '\"' is an ASCII boundary")
                    .to_owned();

                self.advance();

                TokenKind::StrLit(value)
            }
            b'-' => {
                self.advance();

                if self.has_next() && self.first() == b'>' {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            b'+' => self.single(TokenKind::Plus),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b'=' => self.single(TokenKind::Eq),
            b'&' => self.single(TokenKind::BwAnd),
            b'|' => self.single(TokenKind::BwOr),
            b'<' => {
                self.advance();

                match self.has_next().then(|| self.first()) {
                    Some(b'=') => {
                        self.advance();
                        TokenKind::Lte
                    }
                    Some(b'<') => {
                        self.advance();
                        TokenKind::Lsh
                    }
                    _ => TokenKind::Lt,
                }
            }
            b'>' => {
                self.advance();

                match self.has_next().then(|| self.first()) {
                    Some(b'=') => {
                        self.advance();
                        TokenKind::Gte
                    }
                    Some(b'>') => {
                        self.advance();
                        TokenKind::Rsh
                    }
                    _ => TokenKind::Gt,
                }
            }
            b'!' => {
                self.advance();

                if self.has_next() && self.first() == b'=' {
                    self.advance();
                    TokenKind::Neq
                } else {
                    return Err(LexError::UnexpectedCharacter { ch: b'!', pos });
                }
            }
            ch => {
                return Err(LexError::UnexpectedCharacter { ch, pos });
            }
        };

        Ok(Some(Token { kind, pos }))
    }

    /// Skips whitespace and `#`-to-end-of-line comments.
    fn skip_trivia(&mut self) {
        while self.has_next() {
            match self.first() {
                b'#' => {
                    while self.has_next() && self.first() != b'\n' {
                        self.advance();
                    }
                }
                b if b.is_ascii_whitespace() => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Consumes the current byte and emits `kind`.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Consumes one byte, updating the line/column counters.
    fn advance(&mut self) {
        if self.first() == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }

        self.cur += 1;
    }

    /// Returns the byte at the cursor. Panics if the cursor is out of
    /// bounds; callers check `has_next` first.
    #[inline]
    fn first(&self) -> u8 {
        self.src[self.cur]
    }

    #[inline]
    fn has_next(&self) -> bool {
        self.cur < self.src.len()
    }
}

/// Identifiers are `[A-Za-z_][A-Za-z0-9_.]*`; the `.` permits simple
/// namespacing in the standard library.
#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        let file = Rc::new(PathBuf::from("test.tack"));
        let mut lexer = Lexer::new(file, src.as_bytes());
        let mut tokens = vec![];

        while let Some(token) = lexer.next_token().expect("valid source") {
            tokens.push(token);
        }

        tokens
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex_all(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexer_keywords_and_idents() {
        assert_eq!(
            kinds("func main do end frobnicate"),
            vec![
                TokenKind::Func,
                TokenKind::Ident("main".into()),
                TokenKind::Do,
                TokenKind::End,
                TokenKind::Ident("frobnicate".into()),
            ]
        );
    }

    #[test]
    fn lexer_ident_with_dot() {
        assert_eq!(kinds("io.put"), vec![TokenKind::Ident("io.put".into())]);
    }

    #[test]
    fn lexer_numbers() {
        assert_eq!(
            kinds("0 42 1000000"),
            vec![
                TokenKind::Number(0),
                TokenKind::Number(42),
                TokenKind::Number(1000000),
            ]
        );
    }

    #[test]
    fn lexer_operators() {
        assert_eq!(
            kinds("+ - * / < > <= >= = != & | << >> ->"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Lte,
                TokenKind::Gte,
                TokenKind::Eq,
                TokenKind::Neq,
                TokenKind::BwAnd,
                TokenKind::BwOr,
                TokenKind::Lsh,
                TokenKind::Rsh,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn lexer_adjacent_angle_brackets() {
        // '<' twice with no whitespace is a shift, with whitespace two
        // comparisons.
        assert_eq!(kinds("<<"), vec![TokenKind::Lsh]);
        assert_eq!(kinds("< <"), vec![TokenKind::Lt, TokenKind::Lt]);
    }

    #[test]
    fn lexer_minus_vs_arrow() {
        assert_eq!(kinds("- ->"), vec![TokenKind::Minus, TokenKind::Arrow]);
        // '-' directly before a digit stays a minus token; negative
        // literals are spelled with 'neg'.
        assert_eq!(kinds("-1"), vec![TokenKind::Minus, TokenKind::Number(1)]);
    }

    #[test]
    fn lexer_string_literal() {
        assert_eq!(
            kinds("\"Hello, World!\""),
            vec![TokenKind::StrLit("Hello, World!".into())]
        );
    }

    #[test]
    fn lexer_string_no_escapes() {
        // Backslashes pass through verbatim.
        assert_eq!(kinds(r#""a\nb""#), vec![TokenKind::StrLit("a\\nb".into())]);
    }

    #[test]
    fn lexer_comments_skipped() {
        assert_eq!(
            kinds("1 # pushes one\n2"),
            vec![TokenKind::Number(1), TokenKind::Number(2)]
        );
    }

    #[test]
    fn lexer_positions() {
        let tokens = lex_all("func f\n  do end");

        assert_eq!((tokens[0].pos.line, tokens[0].pos.column), (1, 0));
        assert_eq!((tokens[1].pos.line, tokens[1].pos.column), (1, 5));
        assert_eq!((tokens[2].pos.line, tokens[2].pos.column), (2, 2));
        assert_eq!((tokens[3].pos.line, tokens[3].pos.column), (2, 5));
    }

    #[test]
    fn lexer_peek_does_not_consume() {
        let file = Rc::new(PathBuf::from("test.tack"));
        let mut lexer = Lexer::new(file, b"dup drop");

        assert_eq!(lexer.peek().unwrap().unwrap().kind, TokenKind::Dup);
        assert_eq!(lexer.peek().unwrap().unwrap().kind, TokenKind::Dup);
        assert_eq!(lexer.next_token().unwrap().unwrap().kind, TokenKind::Dup);
        assert_eq!(lexer.next_token().unwrap().unwrap().kind, TokenKind::Drop);
        assert!(lexer.next_token().unwrap().is_none());
    }

    #[test]
    fn lexer_unterminated_string() {
        let file = Rc::new(PathBuf::from("test.tack"));
        let mut lexer = Lexer::new(file, b"\"no closing quote");

        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn lexer_unexpected_character() {
        let file = Rc::new(PathBuf::from("test.tack"));
        let mut lexer = Lexer::new(file, b"dup @ drop");

        assert!(lexer.next_token().is_ok());
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnexpectedCharacter { ch: b'@', .. })
        ));
    }

    #[test]
    fn lexer_bare_bang_rejected() {
        let file = Rc::new(PathBuf::from("test.tack"));
        let mut lexer = Lexer::new(file, b"! drop");

        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnexpectedCharacter { ch: b'!', .. })
        ));
    }
}
