//! The parser (C3): recursive-descent, hand-written, with a precedence
//! cascade for expressions and formulas following the table in the language
//! reference. Errors are recoverable: on an unexpected token inside a block
//! we consume up to a synchronization point and keep going so later
//! declarations still get parsed.

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::source::Span;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    module: Module,
    diagnostics: Vec<Diagnostic>,
}

/// Parses a complete module from source text, returning the AST (always
/// present, possibly partial) and any diagnostics raised along the way.
pub fn parse(source: &str) -> (Module, Vec<Diagnostic>) {
    let tokens = crate::lexer::Lexer::tokenize(source);
    let mut parser = Parser {
        tokens,
        pos: 0,
        module: Module::default(),
        diagnostics: Vec::new(),
    };
    parser.parse_module();
    (parser.module, parser.diagnostics)
}

const TOP_LEVEL_STARTERS: &[TokenKind] = &[
    TokenKind::KwModule,
    TokenKind::KwOpen,
    TokenKind::KwSig,
    TokenKind::KwAbstract,
    TokenKind::KwVar,
    TokenKind::KwFact,
    TokenKind::KwPred,
    TokenKind::KwFun,
    TokenKind::KwAssert,
    TokenKind::KwEnum,
    TokenKind::KwRun,
    TokenKind::KwCheck,
];

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.check(&kind) {
            Some(self.bump())
        } else {
            self.error(format!("expected {what}, found {:?}", self.peek_kind()));
            None
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error("E_PARSE", message, self.span()));
    }

    fn alloc(&mut self, node: ExprNode) -> ExprId {
        self.module.alloc(node)
    }

    fn error_expr(&mut self) -> ExprId {
        self.alloc(ExprNode::Error)
    }

    fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::RBrace | TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                kind if TOP_LEVEL_STARTERS.contains(kind) => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // ---- module-level ----

    fn parse_module(&mut self) {
        if self.eat(&TokenKind::KwModule) {
            self.parse_dotted_path();
        }

        while !self.at_eof() {
            match self.peek_kind() {
                TokenKind::KwOpen => self.parse_open(),
                TokenKind::KwSig | TokenKind::KwAbstract | TokenKind::KwVar => self.parse_sig(),
                TokenKind::KwFact => self.parse_fact(),
                TokenKind::KwPred => self.parse_pred(),
                TokenKind::KwFun => self.parse_fun(),
                TokenKind::KwAssert => self.parse_assert(),
                TokenKind::KwEnum => self.parse_enum(),
                TokenKind::KwRun | TokenKind::KwCheck => self.parse_command(),
                _ => {
                    self.error(format!("unexpected top-level token {:?}", self.peek_kind()));
                    self.synchronize();
                }
            }
        }
    }

    fn parse_dotted_path(&mut self) -> String {
        let mut parts = Vec::new();
        if let Some(tok) = self.expect(TokenKind::Ident, "a module name") {
            parts.push(tok.lexeme);
        }
        while self.eat(&TokenKind::Dot) {
            if let Some(tok) = self.expect(TokenKind::Ident, "a path segment") {
                parts.push(tok.lexeme);
            }
        }
        parts.join("/")
    }

    fn parse_open(&mut self) {
        let start = self.span();
        self.bump(); // open
        let path = self.parse_dotted_path();
        let alias = if self.eat(&TokenKind::KwAs) {
            self.expect(TokenKind::Ident, "an alias").map(|t| t.lexeme)
        } else {
            None
        };
        let span = start.merge(&self.span());
        self.module.opens.push(Open { path, alias, span });
    }

    fn parse_sig(&mut self) {
        let start = self.span();
        let var = self.eat(&TokenKind::KwVar);
        let abstract_ = self.eat(&TokenKind::KwAbstract);
        let var = var || self.eat(&TokenKind::KwVar);

        let multiplicity = self.parse_optional_mult();
        self.eat(&TokenKind::KwSig);

        let mut names = Vec::new();
        if let Some(tok) = self.expect(TokenKind::Ident, "a signature name") {
            names.push(tok.lexeme);
        }
        while self.eat(&TokenKind::Comma) {
            if let Some(tok) = self.expect(TokenKind::Ident, "a signature name") {
                names.push(tok.lexeme);
            }
        }

        let mut extends = None;
        let mut subset_of = Vec::new();
        if self.eat(&TokenKind::KwExtends) {
            extends = self.expect(TokenKind::Ident, "a parent signature").map(|t| t.lexeme);
        } else if self.eat(&TokenKind::KwIn) {
            if let Some(tok) = self.expect(TokenKind::Ident, "a parent signature") {
                subset_of.push(tok.lexeme);
            }
            while self.eat(&TokenKind::Plus) {
                if let Some(tok) = self.expect(TokenKind::Ident, "a parent signature") {
                    subset_of.push(tok.lexeme);
                }
            }
        }

        let mut fields = Vec::new();
        if self.expect(TokenKind::LBrace, "'{'").is_some() {
            while !self.check(&TokenKind::RBrace) && !self.at_eof() {
                fields.push(self.parse_field());
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, "'}'");
        }

        let span = start.merge(&self.span());
        self.module.signatures.push(SigDecl {
            names,
            abstract_,
            var,
            multiplicity,
            extends,
            subset_of,
            fields,
            span,
        });
    }

    fn parse_optional_mult(&mut self) -> Option<Multiplicity> {
        let m = match self.peek_kind() {
            TokenKind::KwLone => Multiplicity::Lone,
            TokenKind::KwOne => Multiplicity::One,
            TokenKind::KwSome => Multiplicity::Some,
            TokenKind::KwSet => Multiplicity::Set,
            TokenKind::KwSeq => Multiplicity::Seq,
            _ => return None,
        };
        self.bump();
        Some(m)
    }

    fn parse_field(&mut self) -> FieldDecl {
        let start = self.span();
        let disjoint = self.eat(&TokenKind::KwDisj);
        let var = self.eat(&TokenKind::KwVar);

        let mut names = Vec::new();
        if let Some(tok) = self.expect(TokenKind::Ident, "a field name") {
            names.push(tok.lexeme);
        }
        while self.eat(&TokenKind::Comma) {
            if let Some(tok) = self.expect(TokenKind::Ident, "a field name") {
                names.push(tok.lexeme);
            }
        }
        self.expect(TokenKind::Colon, "':'");
        let type_expr = self.parse_expr();
        let span = start.merge(&self.span());
        FieldDecl {
            names,
            disjoint,
            var,
            type_expr,
            span,
        }
    }

    fn parse_fact(&mut self) {
        let start = self.span();
        self.bump();
        let name = if self.check(&TokenKind::Ident) {
            Some(self.bump().lexeme)
        } else {
            None
        };
        let body = self.parse_braced_block();
        let span = start.merge(&self.span());
        self.module.facts.push(Fact { name, body, span });
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.eat(&TokenKind::LParen) {
            while !self.check(&TokenKind::RParen) && !self.at_eof() {
                let name = self
                    .expect(TokenKind::Ident, "a parameter name")
                    .map(|t| t.lexeme)
                    .unwrap_or_default();
                self.expect(TokenKind::Colon, "':'");
                let type_expr = self.parse_expr();
                params.push(Param { name, type_expr });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')'");
        }
        params
    }

    fn parse_receiver_name(&mut self) -> (Option<String>, String) {
        let first = self
            .expect(TokenKind::Ident, "a name")
            .map(|t| t.lexeme)
            .unwrap_or_default();
        if self.eat(&TokenKind::Dot) {
            let name = self
                .expect(TokenKind::Ident, "a name")
                .map(|t| t.lexeme)
                .unwrap_or_default();
            (Some(first), name)
        } else {
            (None, first)
        }
    }

    fn parse_pred(&mut self) {
        let start = self.span();
        self.bump();
        let (receiver, name) = self.parse_receiver_name();
        let params = self.parse_params();
        let body = self.parse_braced_block();
        let span = start.merge(&self.span());
        self.module.preds.push(PredDecl {
            receiver,
            name,
            params,
            body,
            span,
        });
    }

    fn parse_fun(&mut self) {
        let start = self.span();
        self.bump();
        let (receiver, name) = self.parse_receiver_name();
        let params = self.parse_params();
        self.expect(TokenKind::Colon, "':'");
        let return_type = self.parse_expr();
        self.expect(TokenKind::LBrace, "'{'");
        let body = self.parse_expr();
        self.expect(TokenKind::RBrace, "'}'");
        let span = start.merge(&self.span());
        self.module.funs.push(FunDecl {
            receiver,
            name,
            params,
            return_type,
            body,
            span,
        });
    }

    fn parse_assert(&mut self) {
        let start = self.span();
        self.bump();
        let name = if self.check(&TokenKind::Ident) {
            Some(self.bump().lexeme)
        } else {
            None
        };
        let body = self.parse_braced_block();
        let span = start.merge(&self.span());
        self.module.asserts.push(AssertDecl { name, body, span });
    }

    fn parse_enum(&mut self) {
        let start = self.span();
        self.bump();
        let name = self
            .expect(TokenKind::Ident, "an enum name")
            .map(|t| t.lexeme)
            .unwrap_or_default();
        let mut values = Vec::new();
        if self.expect(TokenKind::LBrace, "'{'").is_some() {
            while !self.check(&TokenKind::RBrace) && !self.at_eof() {
                if let Some(tok) = self.expect(TokenKind::Ident, "an enum value") {
                    values.push(tok.lexeme);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, "'}'");
        }
        let span = start.merge(&self.span());
        self.module.enums.push(EnumDecl { name, values, span });
    }

    fn parse_command(&mut self) {
        let start = self.span();
        let kind = if self.eat(&TokenKind::KwRun) {
            CommandKind::Run
        } else {
            self.bump();
            CommandKind::Check
        };

        let name = if self.check(&TokenKind::Ident) {
            Some(self.current().lexeme.clone())
        } else {
            None
        };

        let target = if self.check(&TokenKind::LBrace) {
            CommandTarget::Body(self.parse_braced_block())
        } else if let Some(tok) = self.expect(TokenKind::Ident, "a predicate, function, or assertion name") {
            CommandTarget::Named(tok.lexeme)
        } else {
            CommandTarget::Body(self.error_expr())
        };

        let scope = self.parse_scope();
        let span = start.merge(&self.span());
        self.module.commands.push(Command {
            kind,
            name,
            target,
            scope,
            span,
        });
    }

    fn parse_scope(&mut self) -> Scope {
        const DEFAULT_SCOPE: u32 = 3;
        let mut scope = Scope {
            default_scope: DEFAULT_SCOPE,
            per_sig: Vec::new(),
            steps: None,
        };

        if !self.eat(&TokenKind::KwFor) {
            return scope;
        }

        loop {
            match self.peek_kind() {
                TokenKind::Int => {
                    let n: u32 = self.bump().lexeme.parse().unwrap_or(0);
                    if self.eat(&TokenKind::KwSteps) {
                        scope.steps = Some(n);
                    } else if self.check(&TokenKind::Ident) {
                        let sig = self.bump().lexeme;
                        scope.per_sig.push(SigScope {
                            signature: sig,
                            bound: n,
                            exact: false,
                        });
                    } else {
                        scope.default_scope = n;
                    }
                }
                TokenKind::KwExactly => {
                    self.bump();
                    let n: u32 = self.expect(TokenKind::Int, "a scope bound")
                        .map(|t| t.lexeme.parse().unwrap_or(0))
                        .unwrap_or(0);
                    let sig = self
                        .expect(TokenKind::Ident, "a signature name")
                        .map(|t| t.lexeme)
                        .unwrap_or_default();
                    scope.per_sig.push(SigScope {
                        signature: sig,
                        bound: n,
                        exact: true,
                    });
                }
                TokenKind::KwBut | TokenKind::Comma => {
                    self.bump();
                }
                _ => break,
            }
        }

        scope
    }

    /// A `{ ... }` body: either a relational comprehension (if a `|`
    /// separates declarations from a body at this brace's nesting depth) or
    /// a block of (implicitly conjoined) formulas, which is how fact,
    /// predicate, and command bodies are written.
    fn parse_braced_block(&mut self) -> ExprId {
        if self.expect(TokenKind::LBrace, "'{'").is_none() {
            return self.error_expr();
        }

        if self.looks_like_comprehension() {
            let decls = self.parse_decls();
            self.expect(TokenKind::Pipe, "'|'");
            let body = self.parse_expr();
            self.expect(TokenKind::RBrace, "'}'");
            return self.alloc(ExprNode::Comprehension { decls, body });
        }

        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            items.push(self.parse_expr());
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RBrace, "'}'");
        self.alloc(ExprNode::Block(items))
    }

    /// Scans forward (without consuming) for a top-level `|` before the
    /// matching `}`, which is the signal that this brace opens a
    /// comprehension rather than a formula block.
    fn looks_like_comprehension(&self) -> bool {
        let mut depth = 0i32;
        let mut i = self.pos;
        loop {
            match self.tokens.get(i).map(|t| &t.kind) {
                None | Some(TokenKind::Eof) => return false,
                Some(TokenKind::LBrace) | Some(TokenKind::LParen) | Some(TokenKind::LBracket) => {
                    depth += 1;
                    i += 1;
                }
                Some(TokenKind::RBrace) | Some(TokenKind::RParen) | Some(TokenKind::RBracket) if depth == 0 => {
                    return false;
                }
                Some(TokenKind::RBrace) | Some(TokenKind::RParen) | Some(TokenKind::RBracket) => {
                    depth -= 1;
                    i += 1;
                }
                Some(TokenKind::Pipe) if depth == 0 => return true,
                _ => i += 1,
            }
        }
    }

    fn parse_decls(&mut self) -> Vec<Decl> {
        let mut decls = Vec::new();
        loop {
            let disjoint = self.eat(&TokenKind::KwDisj);
            let mut names = Vec::new();
            if let Some(tok) = self.expect(TokenKind::Ident, "a bound variable name") {
                names.push(tok.lexeme);
            }
            while self.eat(&TokenKind::Comma) && self.peek_is_decl_continuation() {
                if let Some(tok) = self.expect(TokenKind::Ident, "a bound variable name") {
                    names.push(tok.lexeme);
                }
            }
            self.expect(TokenKind::Colon, "':'");
            let _ = self.parse_optional_mult();
            let domain = self.parse_expr_no_pipe();
            decls.push(Decl { names, disjoint, domain });
            if !self.check(&TokenKind::Comma) {
                break;
            }
            // Only continue into another decl group if what follows looks
            // like `name : domain`, not the comprehension body.
            let save = self.pos;
            self.bump();
            if self.check(&TokenKind::Ident) {
                self.pos = save;
                self.bump();
                continue;
            }
            self.pos = save;
            break;
        }
        decls
    }

    fn peek_is_decl_continuation(&self) -> bool {
        self.check(&TokenKind::Ident)
    }

    // ---- expressions / formulas ----

    pub fn parse_expr(&mut self) -> ExprId {
        let left = self.parse_let_quant();
        if self.eat(&TokenKind::Semicolon) {
            let right = self.parse_expr();
            return self.alloc(ExprNode::Sequence(left, right));
        }
        left
    }

    /// Like [`parse_expr`](Self::parse_expr) but stops before consuming a
    /// top-level `|`, for use while scanning a comprehension's domain.
    fn parse_expr_no_pipe(&mut self) -> ExprId {
        self.parse_iff()
    }

    fn parse_let_quant(&mut self) -> ExprId {
        match self.peek_kind() {
            TokenKind::KwLet => {
                self.bump();
                let name = self
                    .expect(TokenKind::Ident, "a let-bound name")
                    .map(|t| t.lexeme)
                    .unwrap_or_default();
                self.expect(TokenKind::Eq, "'='");
                let bound = self.parse_expr_no_pipe();
                self.eat(&TokenKind::Pipe);
                let body = self.parse_let_quant();
                self.alloc(ExprNode::Let { name, bound, body })
            }
            TokenKind::KwAll
            | TokenKind::KwNo
            | TokenKind::KwSome
            | TokenKind::KwOne
            | TokenKind::KwLone
            | TokenKind::KwSum
                if self.quantifier_has_decls() =>
            {
                let quantifier = self.bump_quantifier();
                let decls = self.parse_decls();
                self.expect(TokenKind::Pipe, "'|'");
                let body = self.parse_let_quant();
                self.alloc(ExprNode::Quantified {
                    quantifier,
                    decls,
                    body,
                })
            }
            _ => self.parse_iff(),
        }
    }

    /// A quantifier keyword introduces a bound-variable form only when
    /// followed by `ident (','|':')`; otherwise it's a direct multiplicity
    /// test applied to an expression (`no A`, `some r.A`).
    fn quantifier_has_decls(&self) -> bool {
        matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Ident))
            && matches!(
                self.tokens.get(self.pos + 2).map(|t| &t.kind),
                Some(TokenKind::Colon) | Some(TokenKind::Comma)
            )
    }

    fn bump_quantifier(&mut self) -> Quantifier {
        let q = match self.peek_kind() {
            TokenKind::KwAll => Quantifier::All,
            TokenKind::KwNo => Quantifier::No,
            TokenKind::KwSome => Quantifier::Some,
            TokenKind::KwOne => Quantifier::One,
            TokenKind::KwLone => Quantifier::Lone,
            TokenKind::KwSum => Quantifier::Sum,
            _ => unreachable!("guarded by caller"),
        };
        self.bump();
        q
    }

    fn parse_iff(&mut self) -> ExprId {
        let mut left = self.parse_implies();
        while self.eat(&TokenKind::DoubleArrow) || self.eat(&TokenKind::KwIff) {
            let right = self.parse_implies();
            left = self.alloc(ExprNode::Iff(left, right));
        }
        left
    }

    fn parse_implies(&mut self) -> ExprId {
        let left = self.parse_or();
        if self.eat(&TokenKind::FatArrow) || self.eat(&TokenKind::KwImplies) {
            let right = self.parse_implies();
            if self.eat(&TokenKind::KwElse) {
                let else_branch = self.parse_implies();
                return self.alloc(ExprNode::IfElse {
                    cond: left,
                    then_branch: right,
                    else_branch,
                });
            }
            return self.alloc(ExprNode::Implies(left, right));
        }
        left
    }

    fn parse_or(&mut self) -> ExprId {
        let mut left = self.parse_and();
        while self.eat(&TokenKind::PipePipe) || self.eat(&TokenKind::KwOr) {
            let right = self.parse_and();
            left = self.alloc(ExprNode::Or(left, right));
        }
        left
    }

    fn parse_and(&mut self) -> ExprId {
        let mut left = self.parse_not();
        while self.eat(&TokenKind::AmpAmp) || self.eat(&TokenKind::KwAnd) {
            let right = self.parse_not();
            left = self.alloc(ExprNode::And(left, right));
        }
        left
    }

    fn parse_not(&mut self) -> ExprId {
        if self.eat(&TokenKind::Bang) || self.eat(&TokenKind::KwNot) {
            let operand = self.parse_not();
            return self.alloc(ExprNode::Not(operand));
        }
        self.parse_temporal()
    }

    fn parse_temporal(&mut self) -> ExprId {
        let mut left = self.parse_temporal_unary();
        loop {
            let kind = self.peek_kind().clone();
            match kind {
                TokenKind::KwUntil => {
                    self.bump();
                    let right = self.parse_temporal_unary();
                    left = self.alloc(ExprNode::FutureBin(FutureBinOp::Until, left, right));
                }
                TokenKind::KwReleases => {
                    self.bump();
                    let right = self.parse_temporal_unary();
                    left = self.alloc(ExprNode::FutureBin(FutureBinOp::Releases, left, right));
                }
                TokenKind::KwSince => {
                    self.bump();
                    let right = self.parse_temporal_unary();
                    left = self.alloc(ExprNode::PastBin(PastBinOp::Since, left, right));
                }
                TokenKind::KwTriggered => {
                    self.bump();
                    let right = self.parse_temporal_unary();
                    left = self.alloc(ExprNode::PastBin(PastBinOp::Triggered, left, right));
                }
                _ => break,
            }
        }
        left
    }

    fn parse_temporal_unary(&mut self) -> ExprId {
        match self.peek_kind() {
            TokenKind::KwAlways => {
                self.bump();
                let operand = self.parse_temporal_unary();
                self.alloc(ExprNode::Future(FutureOp::Always, operand))
            }
            TokenKind::KwEventually => {
                self.bump();
                let operand = self.parse_temporal_unary();
                self.alloc(ExprNode::Future(FutureOp::Eventually, operand))
            }
            TokenKind::KwAfter => {
                self.bump();
                let operand = self.parse_temporal_unary();
                self.alloc(ExprNode::Future(FutureOp::After, operand))
            }
            TokenKind::KwHistorically => {
                self.bump();
                let operand = self.parse_temporal_unary();
                self.alloc(ExprNode::Past(PastOp::Historically, operand))
            }
            TokenKind::KwOnce => {
                self.bump();
                let operand = self.parse_temporal_unary();
                self.alloc(ExprNode::Past(PastOp::Once, operand))
            }
            TokenKind::KwBefore => {
                self.bump();
                let operand = self.parse_temporal_unary();
                self.alloc(ExprNode::Past(PastOp::Before, operand))
            }
            _ => self.parse_compare(),
        }
    }

    fn parse_compare(&mut self) -> ExprId {
        let left = self.parse_set_union();
        let op = match self.peek_kind() {
            TokenKind::Eq => Some(CompareOp::Eq),
            TokenKind::NotEq => Some(CompareOp::NotEq),
            TokenKind::Less => Some(CompareOp::Lt),
            TokenKind::Greater => Some(CompareOp::Gt),
            TokenKind::LessEq => Some(CompareOp::LessEq),
            TokenKind::GreaterEq => Some(CompareOp::GreaterEq),
            TokenKind::KwIn => Some(CompareOp::In),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let right = self.parse_set_union();
            return self.alloc(ExprNode::Compare(op, left, right));
        }
        if self.eat(&TokenKind::Bang) && self.eat(&TokenKind::KwIn) {
            let right = self.parse_set_union();
            return self.alloc(ExprNode::Compare(CompareOp::NotIn, left, right));
        }
        left
    }

    fn parse_set_union(&mut self) -> ExprId {
        let mut left = self.parse_set_intersect();
        loop {
            if self.eat(&TokenKind::Plus) {
                let right = self.parse_set_intersect();
                left = self.alloc(ExprNode::SetBinary(SetOp::Union, left, right));
            } else if self.eat(&TokenKind::Minus) {
                let right = self.parse_set_intersect();
                left = self.alloc(ExprNode::SetBinary(SetOp::Difference, left, right));
            } else {
                break;
            }
        }
        left
    }

    fn parse_set_intersect(&mut self) -> ExprId {
        let mut left = self.parse_override();
        while self.eat(&TokenKind::Amp) {
            let right = self.parse_override();
            left = self.alloc(ExprNode::SetBinary(SetOp::Intersection, left, right));
        }
        left
    }

    fn parse_override(&mut self) -> ExprId {
        let mut left = self.parse_restrict();
        while self.eat(&TokenKind::PlusPlus) {
            let right = self.parse_restrict();
            left = self.alloc(ExprNode::SetBinary(SetOp::Override, left, right));
        }
        left
    }

    fn parse_restrict(&mut self) -> ExprId {
        let mut left = self.parse_arrow();
        loop {
            if self.eat(&TokenKind::DomRestrict) {
                let right = self.parse_arrow();
                left = self.alloc(ExprNode::SetBinary(SetOp::DomRestrict, left, right));
            } else if self.eat(&TokenKind::RanRestrict) {
                let right = self.parse_arrow();
                left = self.alloc(ExprNode::SetBinary(SetOp::RanRestrict, left, right));
            } else {
                break;
            }
        }
        left
    }

    fn parse_arrow(&mut self) -> ExprId {
        let left_mult = self.parse_optional_mult();
        let left = self.parse_join();
        if self.eat(&TokenKind::Arrow) {
            let right_mult = self.parse_optional_mult();
            let right = self.parse_arrow();
            return self.alloc(ExprNode::Arrow {
                left,
                left_mult,
                right,
                right_mult,
            });
        }
        left
    }

    fn parse_join(&mut self) -> ExprId {
        let mut left = self.parse_unary_rel();
        while self.eat(&TokenKind::Dot) {
            let right = self.parse_unary_rel();
            left = self.alloc(ExprNode::SetBinary(SetOp::Join, left, right));
        }
        left
    }

    fn parse_unary_rel(&mut self) -> ExprId {
        match self.peek_kind() {
            TokenKind::Tilde => {
                self.bump();
                let operand = self.parse_unary_rel();
                self.alloc(ExprNode::UnaryRel(UnaryRelOp::Transpose, operand))
            }
            TokenKind::Caret => {
                self.bump();
                let operand = self.parse_unary_rel();
                self.alloc(ExprNode::UnaryRel(UnaryRelOp::Closure, operand))
            }
            TokenKind::Star => {
                self.bump();
                let operand = self.parse_unary_rel();
                self.alloc(ExprNode::UnaryRel(UnaryRelOp::ReflexiveClosure, operand))
            }
            TokenKind::Hash => {
                self.bump();
                let operand = self.parse_unary_rel();
                self.alloc(ExprNode::UnaryRel(UnaryRelOp::Cardinality, operand))
            }
            TokenKind::KwNo | TokenKind::KwSome | TokenKind::KwOne | TokenKind::KwLone => {
                let quantifier = self.bump_quantifier();
                let operand = self.parse_unary_rel();
                self.alloc(ExprNode::SetTest(quantifier, operand))
            }
            _ => self.parse_prime(),
        }
    }

    fn parse_prime(&mut self) -> ExprId {
        let mut left = self.parse_primary();
        loop {
            if self.eat(&TokenKind::Prime) {
                left = self.alloc(ExprNode::Prime(left));
            } else if self.eat(&TokenKind::At) {
                let right = self.parse_primary();
                left = self.alloc(ExprNode::At(left, right));
            } else {
                break;
            }
        }
        left
    }

    fn parse_primary(&mut self) -> ExprId {
        let tok = self.current().clone();
        match &tok.kind {
            TokenKind::Ident => {
                self.bump();
                let mut node = self.alloc(ExprNode::Ident(tok.lexeme.clone()));
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_call_args();
                    node = self.alloc(ExprNode::Call {
                        receiver: None,
                        name: tok.lexeme,
                        args,
                    });
                }
                node
            }
            TokenKind::Int => {
                self.bump();
                let value: i64 = tok.lexeme.parse().unwrap_or(0);
                self.alloc(ExprNode::IntLit(value))
            }
            TokenKind::Str => {
                self.bump();
                self.alloc(ExprNode::StrLit(tok.lexeme.clone()))
            }
            TokenKind::KwUniv => {
                self.bump();
                self.alloc(ExprNode::Univ)
            }
            TokenKind::KwIden => {
                self.bump();
                self.alloc(ExprNode::Iden)
            }
            TokenKind::KwNone => {
                self.bump();
                self.alloc(ExprNode::None_)
            }
            TokenKind::KwInt => {
                self.bump();
                self.alloc(ExprNode::IntType)
            }
            TokenKind::KwThis => {
                self.bump();
                self.alloc(ExprNode::This)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(TokenKind::RParen, "')'");
                inner
            }
            TokenKind::LBrace => self.parse_braced_block(),
            _ => {
                self.error(format!("unexpected token {:?} in expression", tok.kind));
                self.bump();
                self.error_expr()
            }
        }
    }

    fn parse_call_args(&mut self) -> Vec<ExprId> {
        let mut args = Vec::new();
        self.bump(); // '('
        while !self.check(&TokenKind::RParen) && !self.at_eof() {
            args.push(self.parse_expr());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'");
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Module {
        let (module, diags) = parse(source);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        module
    }

    #[test]
    fn parses_a_bare_signature_and_run_command() {
        let module = parse_ok("sig A {} run {} for 3");
        assert_eq!(module.signatures.len(), 1);
        assert_eq!(module.signatures[0].names, vec!["A".to_string()]);
        assert_eq!(module.commands.len(), 1);
        assert_eq!(module.commands[0].scope.default_scope, 3);
    }

    #[test]
    fn parses_a_field_and_quantified_fact() {
        let module = parse_ok("sig A { r: A } fact { no a: A | a in a.^r } run {} for 3");
        assert_eq!(module.signatures[0].fields.len(), 1);
        assert_eq!(module.facts.len(), 1);
        match module.expr(module.facts[0].body) {
            ExprNode::Block(items) => assert_eq!(items.len(), 1),
            other => panic!("expected a block, got {other:?}"),
        }
    }

    #[test]
    fn parses_direct_multiplicity_tests() {
        let module = parse_ok("sig A {} fact { some A and no A } run {} for 3");
        let body = module.facts[0].body;
        match module.expr(body) {
            ExprNode::Block(items) => {
                assert_eq!(items.len(), 1);
                match module.expr(items[0]) {
                    ExprNode::And(_, _) => {}
                    other => panic!("expected And, got {other:?}"),
                }
            }
            other => panic!("expected a block, got {other:?}"),
        }
    }

    #[test]
    fn parses_var_sig_and_temporal_facts_with_steps() {
        let module = parse_ok(
            "var sig S {} fact { always no S and eventually some S } run {} for 3 but 3 steps",
        );
        assert!(module.signatures[0].var);
        assert_eq!(module.commands[0].scope.steps, Some(3));
    }

    #[test]
    fn recovers_from_an_error_inside_a_block_and_keeps_parsing() {
        let (module, diags) = parse("sig A {} fact { @@@ } sig B {}");
        assert!(!diags.is_empty());
        assert_eq!(module.signatures.len(), 2);
    }
}
