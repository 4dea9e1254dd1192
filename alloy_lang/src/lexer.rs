//! The lexer (C2): surface syntax to token stream.
//!
//! Hand-written rather than built on a lexer-generator crate: the surface
//! grammar has only a handful of multi-character operators and two comment
//! styles, which a small hand-rolled cursor covers directly and lets error
//! spans stay exact.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::source::{Position, Span};
use crate::token::{keyword, Token, TokenKind};

/// Walks a source string, tracking line, column, and byte offset, and
/// yielding one token at a time.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: u32,
    column: u32,
    offset: u32,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            offset: 0,
            done: false,
        }
    }

    /// Lexes the entire source into a token vector, always ending in exactly
    /// one `Eof` token.
    pub fn tokenize(source: &'a str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn pos(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek2(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.offset += c.len_utf8() as u32;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn slice(&self, start: u32, end: u32) -> &'a str {
        &self.source[start as usize..end as usize]
    }

    /// Skips whitespace and comments. Returns the start position of an
    /// unterminated block comment, if one was encountered -- the caller is
    /// responsible for turning that into an invalid token, since by the time
    /// this returns the comment's text has already been consumed.
    fn skip_trivia(&mut self) -> Option<Position> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    self.skip_line_comment();
                }
                Some('-') if self.peek2() == Some('-') => {
                    self.skip_line_comment();
                }
                Some('/') if self.peek2() == Some('*') => {
                    if let Some(start) = self.skip_block_comment() {
                        return Some(start);
                    }
                }
                _ => return None,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Consumes a `/* ... */` comment. Returns `Some(start)` if it never
    /// finds a closing `*/` before end of input.
    fn skip_block_comment(&mut self) -> Option<Position> {
        let start = self.pos();
        self.bump(); // '/'
        self.bump(); // '*'
        loop {
            match self.peek_char() {
                None => return Some(start),
                Some('*') if self.peek2() == Some('/') => {
                    self.bump();
                    self.bump();
                    return None;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(comment_start) = self.skip_trivia() {
            let end = self.pos();
            return Token::new(
                TokenKind::Invalid("Unterminated block comment".to_string()),
                Span::new(comment_start, end),
                self.slice(comment_start.offset, end.offset),
            );
        }

        let start = self.pos();

        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::Eof, Span::point(start), "");
        };

        if c.is_alphabetic() || c == '_' || c == '$' {
            return self.lex_ident(start);
        }
        if c.is_ascii_digit() {
            return self.lex_int(start);
        }
        if c == '"' {
            return self.lex_string(start);
        }
        self.lex_operator(start)
    }

    fn lex_ident(&mut self, start: Position) -> Token {
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.pos();
        let text = self.slice(start.offset, end.offset);
        let kind = keyword(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, Span::new(start, end), text)
    }

    fn lex_int(&mut self, start: Position) -> Token {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.pos();
        let text = self.slice(start.offset, end.offset);
        match text.parse::<i64>() {
            Ok(_) => Token::new(TokenKind::Int, Span::new(start, end), text),
            Err(_) => Token::new(
                TokenKind::Invalid(format!("Integer literal too large: {text}")),
                Span::new(start, end),
                text,
            ),
        }
    }

    fn lex_string(&mut self, start: Position) -> Token {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    let end = self.pos();
                    return Token::new(
                        TokenKind::Invalid("Unterminated string literal".to_string()),
                        Span::new(start, end),
                        value,
                    );
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some(other) => value.push(other),
                        None => {
                            let end = self.pos();
                            return Token::new(
                                TokenKind::Invalid("Unterminated string literal".to_string()),
                                Span::new(start, end),
                                value,
                            );
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        let end = self.pos();
        Token::new(TokenKind::Str, Span::new(start, end), value)
    }

    fn lex_operator(&mut self, start: Position) -> Token {
        use TokenKind::*;
        let c = self.bump().unwrap();
        let next = self.peek_char();

        macro_rules! two {
            ($second:expr, $kind:expr, $fallback:expr) => {
                if next == Some($second) {
                    self.bump();
                    $kind
                } else {
                    $fallback
                }
            };
        }

        let kind = match c {
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            ',' => Comma,
            ':' => two!('>', RanRestrict, Colon),
            ';' => Semicolon,
            '|' => two!('|', PipePipe, Pipe),
            '@' => At,
            '\'' => Prime,
            '.' => Dot,
            '-' => two!('>', Arrow, Minus),
            '=' => {
                if next == Some('<') {
                    self.bump();
                    LessEq
                } else if next == Some('>') {
                    self.bump();
                    FatArrow
                } else {
                    Eq
                }
            }
            '>' => two!('=', GreaterEq, Greater),
            '<' => {
                if next == Some(':') {
                    self.bump();
                    DomRestrict
                } else if next == Some('=') {
                    self.bump();
                    if self.peek_char() == Some('>') {
                        self.bump();
                        DoubleArrow
                    } else {
                        LessEq
                    }
                } else {
                    Less
                }
            }
            '+' => two!('+', PlusPlus, Plus),
            '&' => two!('&', AmpAmp, Amp),
            '~' => Tilde,
            '^' => Caret,
            '*' => Star,
            '#' => Hash,
            '!' => {
                if next == Some('=') {
                    self.bump();
                    NotEq
                } else {
                    Bang
                }
            }
            other => Invalid(format!("Invalid character: {other:?}")),
        };

        let end = self.pos();
        Token::new(kind, Span::new(start, end), self.slice(start.offset, end.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_only_eof() {
        let tokens = Lexer::tokenize("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }

    #[test]
    fn lexes_a_signature_declaration() {
        let tokens = Lexer::tokenize("sig A {}");
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenKind::KwSig,
                &TokenKind::Ident,
                &TokenKind::LBrace,
                &TokenKind::RBrace,
                &TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_both_comment_styles() {
        let tokens = Lexer::tokenize("// a\n-- b\nsig A {}");
        assert_eq!(tokens[0].kind, TokenKind::KwSig);
    }

    #[test]
    fn unterminated_block_comment_is_invalid() {
        let tokens = Lexer::tokenize("/* never closes");
        assert!(matches!(tokens[0].kind, TokenKind::Invalid(_)));
    }

    #[test]
    fn unterminated_string_is_invalid() {
        let tokens = Lexer::tokenize("\"oops");
        assert!(matches!(tokens[0].kind, TokenKind::Invalid(_)));
    }

    #[test]
    fn greedy_longest_multi_char_operators() {
        let tokens = Lexer::tokenize("<=> <: :> -> => =< >= ++ && || !=");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::DoubleArrow,
                TokenKind::DomRestrict,
                TokenKind::RanRestrict,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::PlusPlus,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::NotEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexer_coverage_spans_partition_the_source() {
        let source = "sig A {} -- trailing comment\n";
        let tokens = Lexer::tokenize(source);
        let last = tokens.last().unwrap();
        assert!(last.is_eof());
        assert_eq!(last.span.start.offset as usize, source.len());
    }
}
