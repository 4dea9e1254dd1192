//! Token kinds (C2 data model): the closed sum the lexer classifies source
//! text into.

use std::fmt;

use crate::source::Span;

/// A tagged lexical unit: a kind, the span of source text it covers, and the
/// literal text it was lexed from (kept so literals and identifiers don't
/// need a second pass over the source to recover their spelling).
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Token {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// The closed set of lexical categories recognised in the surface language.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals and names
    Ident,
    Int,
    Str,

    // Module / import
    KwModule,
    KwOpen,
    KwAs,

    // Signature modifiers / shape
    KwSig,
    KwAbstract,
    KwExtends,
    KwIn,
    KwVar,

    // Declaration kinds
    KwFact,
    KwPred,
    KwFun,
    KwAssert,
    KwEnum,

    // Commands
    KwRun,
    KwCheck,
    KwFor,
    KwBut,
    KwExactly,
    KwSteps,
    KwExpect,

    // Multiplicity
    KwLone,
    KwOne,
    KwSome,
    KwSet,
    KwSeq,
    KwDisj,

    // Quantifiers / boolean
    KwAll,
    KwNo,
    KwSum,
    KwAnd,
    KwOr,
    KwNot,
    KwImplies,
    KwIff,
    KwElse,
    KwLet,

    // Future temporal
    KwAlways,
    KwEventually,
    KwAfter,
    KwUntil,
    KwReleases,

    // Past temporal
    KwHistorically,
    KwOnce,
    KwBefore,
    KwSince,
    KwTriggered,

    // Built-ins
    KwUniv,
    KwIden,
    KwNone,
    KwInt,
    KwThis,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Pipe,
    At,
    Prime,
    Dot,

    // Operators
    Arrow,      // ->
    LessEq,     // =<
    GreaterEq,  // >=
    DomRestrict, // <:
    RanRestrict, // :>
    PlusPlus,   // ++
    AmpAmp,     // &&
    PipePipe,   // ||
    FatArrow,   // =>
    DoubleArrow, // <=>
    NotEq,      // !=
    Eq,         // =
    Less,       // <
    Greater,    // >
    Plus,       // +
    Minus,      // -
    Amp,        // &
    Tilde,      // ~
    Caret,      // ^
    Star,       // *
    Hash,       // #
    Bang,       // !

    Eof,
    /// An invalid token; carries a human-readable message describing why.
    Invalid(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The fixed keyword table consulted once an identifier has been fully read.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "module" => KwModule,
        "open" => KwOpen,
        "as" => KwAs,
        "sig" => KwSig,
        "abstract" => KwAbstract,
        "extends" => KwExtends,
        "in" => KwIn,
        "var" => KwVar,
        "fact" => KwFact,
        "pred" => KwPred,
        "fun" => KwFun,
        "assert" => KwAssert,
        "enum" => KwEnum,
        "run" => KwRun,
        "check" => KwCheck,
        "for" => KwFor,
        "but" => KwBut,
        "exactly" => KwExactly,
        "steps" => KwSteps,
        "expect" => KwExpect,
        "lone" => KwLone,
        "one" => KwOne,
        "some" => KwSome,
        "set" => KwSet,
        "seq" => KwSeq,
        "disj" => KwDisj,
        "all" => KwAll,
        "no" => KwNo,
        "sum" => KwSum,
        "and" => KwAnd,
        "or" => KwOr,
        "not" => KwNot,
        "implies" => KwImplies,
        "iff" => KwIff,
        "else" => KwElse,
        "let" => KwLet,
        "always" => KwAlways,
        "eventually" => KwEventually,
        "after" => KwAfter,
        "until" => KwUntil,
        "releases" => KwReleases,
        "historically" => KwHistorically,
        "once" => KwOnce,
        "before" => KwBefore,
        "since" => KwSince,
        "triggered" => KwTriggered,
        "univ" => KwUniv,
        "iden" => KwIden,
        "none" => KwNone,
        "Int" => KwInt,
        "this" => KwThis,
        _ => return None,
    })
}
