//! The semantic analyzer (C4): builds the symbol table, resolves names,
//! checks structural well-formedness, and gives each expression node a
//! shallow type (its candidate signatures, when known).

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::source::Span;
use crate::symbols::{AssertSymbol, EnumSymbol, FieldSymbol, FunSymbol, PredSymbol, SigSymbol, SymbolTable};

/// The set of signatures an expression might denote, inferred shallowly.
/// Empty means "not known to be relational" (a formula, an integer, or
/// something this analyzer didn't trace through).
#[derive(Clone, Debug, Default)]
pub struct TypeInfo(pub Vec<crate::symbols::SigId>);

pub struct AnalysisResult {
    pub symbols: SymbolTable,
    pub types: HashMap<ExprId, TypeInfo>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn analyze(module: &Module) -> AnalysisResult {
    let mut analyzer = Analyzer {
        module,
        symbols: SymbolTable::default(),
        types: HashMap::new(),
        diagnostics: Vec::new(),
    };
    analyzer.run();
    AnalysisResult {
        symbols: analyzer.symbols,
        types: analyzer.types,
        diagnostics: analyzer.diagnostics,
    }
}

struct Analyzer<'a> {
    module: &'a Module,
    symbols: SymbolTable,
    types: HashMap<ExprId, TypeInfo>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    fn run(&mut self) {
        self.declare_signatures();
        self.link_signatures();
        self.check_inheritance_cycles();
        self.declare_enums();
        self.declare_preds_funs_asserts();
        self.resolve_commands();
        self.resolve_expressions();
    }

    fn declare_signatures(&mut self) {
        for decl in &self.module.signatures {
            for name in &decl.names {
                if self.symbols.sig_by_name.contains_key(name) {
                    self.diagnostics.push(Diagnostic::error(
                        "E_DUP_SIG",
                        format!("duplicate signature name '{name}'"),
                        decl.span,
                    ));
                    continue;
                }
                let id = self.symbols.sigs.len();
                self.symbols.sigs.push(SigSymbol {
                    name: name.clone(),
                    abstract_: decl.abstract_,
                    var: decl.var,
                    multiplicity: decl.multiplicity,
                    parent: None,
                    subset_of: Vec::new(),
                    fields: Vec::new(),
                    span: decl.span,
                });
                self.symbols.sig_by_name.insert(name.clone(), id);
            }
        }
    }

    fn link_signatures(&mut self) {
        for decl in &self.module.signatures {
            for name in &decl.names {
                let Some(&id) = self.symbols.sig_by_name.get(name) else {
                    continue;
                };

                if let Some(parent_name) = &decl.extends {
                    match self.symbols.sig_by_name.get(parent_name).copied() {
                        Some(parent_id) => self.symbols.sigs[id].parent = Some(parent_id),
                        None => self.diagnostics.push(Diagnostic::error(
                            "E_UNDEF_SIG",
                            format!("'{parent_name}' does not name a signature"),
                            decl.span,
                        )),
                    }
                }

                for subset_name in &decl.subset_of {
                    match self.symbols.sig_by_name.get(subset_name).copied() {
                        Some(sub_id) => self.symbols.sigs[id].subset_of.push(sub_id),
                        None => self.diagnostics.push(Diagnostic::error(
                            "E_UNDEF_SIG",
                            format!("'{subset_name}' does not name a signature"),
                            decl.span,
                        )),
                    }
                }

                for field in &decl.fields {
                    for field_name in &field.names {
                        self.symbols.sigs[id].fields.push(FieldSymbol {
                            name: field_name.clone(),
                            owner: id,
                            disjoint: field.disjoint,
                            var: field.var,
                            type_expr: field.type_expr,
                            span: field.span,
                        });
                    }
                }
            }
        }
    }

    fn check_inheritance_cycles(&mut self) {
        for id in 0..self.symbols.sigs.len() {
            let mut seen = HashSet::new();
            let mut current = Some(id);
            while let Some(node) = current {
                if !seen.insert(node) {
                    self.diagnostics.push(Diagnostic::error(
                        "E_EXTENDS_CYCLE",
                        format!("'{}' has a cyclic extends chain", self.symbols.sigs[id].name),
                        self.symbols.sigs[id].span,
                    ));
                    break;
                }
                current = self.symbols.sigs[node].parent;
            }
        }
    }

    fn declare_enums(&mut self) {
        for decl in &self.module.enums {
            if self.symbols.enums.contains_key(&decl.name) {
                self.diagnostics.push(Diagnostic::error(
                    "E_DUP_ENUM",
                    format!("duplicate enum name '{}'", decl.name),
                    decl.span,
                ));
                continue;
            }
            for (index, value) in decl.values.iter().enumerate() {
                if self.symbols.enum_values.contains_key(value) {
                    self.diagnostics.push(Diagnostic::error(
                        "E_DUP_ENUM_VALUE",
                        format!("duplicate enum value '{value}'"),
                        decl.span,
                    ));
                    continue;
                }
                self.symbols
                    .enum_values
                    .insert(value.clone(), (decl.name.clone(), index));
            }
            self.symbols.enums.insert(
                decl.name.clone(),
                EnumSymbol {
                    name: decl.name.clone(),
                    values: decl.values.clone(),
                    span: decl.span,
                },
            );
        }
    }

    fn declare_preds_funs_asserts(&mut self) {
        for pred in &self.module.preds {
            let receiver = pred.receiver.as_ref().and_then(|r| self.symbols.sig_by_name.get(r)).copied();
            if self.symbols.preds.contains_key(&pred.name) {
                self.diagnostics.push(Diagnostic::error(
                    "E_DUP_PRED",
                    format!("duplicate predicate name '{}'", pred.name),
                    pred.span,
                ));
            }
            self.symbols.preds.insert(
                pred.name.clone(),
                PredSymbol {
                    name: pred.name.clone(),
                    receiver,
                    params: pred.params.iter().map(|p| (p.name.clone(), p.type_expr)).collect(),
                    body: pred.body,
                    span: pred.span,
                },
            );
        }

        for fun in &self.module.funs {
            let receiver = fun.receiver.as_ref().and_then(|r| self.symbols.sig_by_name.get(r)).copied();
            if self.symbols.funs.contains_key(&fun.name) {
                self.diagnostics.push(Diagnostic::error(
                    "E_DUP_FUN",
                    format!("duplicate function name '{}'", fun.name),
                    fun.span,
                ));
            }
            self.symbols.funs.insert(
                fun.name.clone(),
                FunSymbol {
                    name: fun.name.clone(),
                    receiver,
                    params: fun.params.iter().map(|p| (p.name.clone(), p.type_expr)).collect(),
                    return_type: fun.return_type,
                    body: fun.body,
                    span: fun.span,
                },
            );
        }

        for assertion in &self.module.asserts {
            let name = assertion.name.clone().unwrap_or_else(|| "_anon".to_string());
            self.symbols.asserts.insert(
                name.clone(),
                AssertSymbol {
                    name,
                    body: assertion.body,
                    span: assertion.span,
                },
            );
        }
    }

    fn resolve_commands(&mut self) {
        for command in &self.module.commands {
            if let CommandTarget::Named(name) = &command.target {
                let known = self.symbols.preds.contains_key(name)
                    || self.symbols.funs.contains_key(name)
                    || self.symbols.asserts.contains_key(name);
                if !known {
                    self.diagnostics.push(Diagnostic::error(
                        "E_UNDEF_COMMAND_TARGET",
                        format!("command target '{name}' is not a declared predicate, function, or assertion"),
                        command.span,
                    ));
                }
            }
            for sig_scope in &command.scope.per_sig {
                if self.symbols.sig_named(&sig_scope.signature).is_none() {
                    self.diagnostics.push(Diagnostic::error(
                        "E_UNDEF_SIG",
                        format!("scope refers to unknown signature '{}'", sig_scope.signature),
                        command.span,
                    ));
                }
            }
        }
    }

    /// Walks every expression reachable from a declaration (field types,
    /// fact/predicate/function/assertion bodies, command bodies) resolving
    /// free identifiers against an enclosing scope of bound names, falling
    /// back to the global signature/enum-value namespace. Diagnostics raised
    /// while walking anchor to the declaration the expression came from,
    /// since individual expression nodes don't carry their own span.
    fn resolve_expressions(&mut self) {
        let roots = self.collect_roots();
        for (root, anchor) in roots {
            let mut scope: Vec<String> = Vec::new();
            self.walk_expr(root, anchor, &mut scope);
        }
    }

    fn collect_roots(&self) -> Vec<(ExprId, Span)> {
        let mut roots = Vec::new();
        for decl in &self.module.signatures {
            for field in &decl.fields {
                roots.push((field.type_expr, field.span));
            }
        }
        for fact in &self.module.facts {
            roots.push((fact.body, fact.span));
        }
        for pred in &self.module.preds {
            for param in &pred.params {
                roots.push((param.type_expr, pred.span));
            }
            roots.push((pred.body, pred.span));
        }
        for fun in &self.module.funs {
            for param in &fun.params {
                roots.push((param.type_expr, fun.span));
            }
            roots.push((fun.return_type, fun.span));
            roots.push((fun.body, fun.span));
        }
        for assertion in &self.module.asserts {
            roots.push((assertion.body, assertion.span));
        }
        for command in &self.module.commands {
            if let CommandTarget::Body(body) = &command.target {
                roots.push((*body, command.span));
            }
        }
        roots
    }

    fn walk_expr(&mut self, id: ExprId, anchor: Span, scope: &mut Vec<String>) {
        let node = self.module.expr(id).clone();
        match node {
            ExprNode::Ident(name) => {
                self.types.insert(id, self.type_of_name(&name, scope));
                if !scope.contains(&name)
                    && !self.symbols.sig_by_name.contains_key(&name)
                    && !self.symbols.enum_values.contains_key(&name)
                    && !self.is_field_name(&name)
                {
                    self.diagnostics.push(Diagnostic::error(
                        "E_UNDEF_NAME",
                        format!("undefined name '{name}'"),
                        anchor,
                    ));
                }
            }
            ExprNode::IntLit(_) | ExprNode::StrLit(_) | ExprNode::Univ | ExprNode::Iden
            | ExprNode::None_ | ExprNode::IntType | ExprNode::This | ExprNode::Error => {}

            ExprNode::And(a, b)
            | ExprNode::Or(a, b)
            | ExprNode::Implies(a, b)
            | ExprNode::Iff(a, b)
            | ExprNode::Compare(_, a, b)
            | ExprNode::SetBinary(_, a, b)
            | ExprNode::At(a, b)
            | ExprNode::FutureBin(_, a, b)
            | ExprNode::PastBin(_, a, b)
            | ExprNode::Sequence(a, b) => {
                self.walk_expr(a, anchor, scope);
                self.walk_expr(b, anchor, scope);
            }

            ExprNode::Not(a)
            | ExprNode::UnaryRel(_, a)
            | ExprNode::Prime(a)
            | ExprNode::Future(_, a)
            | ExprNode::Past(_, a)
            | ExprNode::SetTest(_, a) => {
                self.walk_expr(a, anchor, scope);
            }

            ExprNode::Arrow {
                left, right, ..
            } => {
                self.walk_expr(left, anchor, scope);
                self.walk_expr(right, anchor, scope);
            }

            ExprNode::Quantified { decls, body, .. } | ExprNode::Comprehension { decls, body } => {
                let added = self.walk_decls(&decls, anchor, scope);
                self.walk_expr(body, anchor, scope);
                scope.truncate(scope.len() - added);
            }

            ExprNode::Let { name, bound, body } => {
                self.walk_expr(bound, anchor, scope);
                scope.push(name);
                self.walk_expr(body, anchor, scope);
                scope.pop();
            }

            ExprNode::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                self.walk_expr(cond, anchor, scope);
                self.walk_expr(then_branch, anchor, scope);
                self.walk_expr(else_branch, anchor, scope);
            }

            ExprNode::Block(items) => {
                for item in items {
                    self.walk_expr(item, anchor, scope);
                }
            }

            ExprNode::Call { receiver, args, .. } => {
                if let Some(r) = receiver {
                    self.walk_expr(r, anchor, scope);
                }
                for arg in args {
                    self.walk_expr(arg, anchor, scope);
                }
            }
        }
    }

    fn walk_decls(&mut self, decls: &[Decl], anchor: Span, scope: &mut Vec<String>) -> usize {
        let mut added = 0;
        for decl in decls {
            self.walk_expr(decl.domain, anchor, scope);
            for name in &decl.names {
                scope.push(name.clone());
                added += 1;
            }
        }
        added
    }

    fn type_of_name(&self, name: &str, scope: &[String]) -> TypeInfo {
        if scope.contains(&name.to_string()) {
            return TypeInfo::default();
        }
        match self.symbols.sig_by_name.get(name) {
            Some(&id) => TypeInfo(vec![id]),
            None => TypeInfo::default(),
        }
    }

    /// A bare field name (e.g. `r` in `a.r`) is a valid reference to that
    /// field's relation regardless of which signature declares it -- join
    /// lowering qualifies it against the left operand's signature, so name
    /// resolution here only needs to know *some* signature declares it.
    fn is_field_name(&self, name: &str) -> bool {
        self.symbols.sigs.iter().any(|sig| sig.fields.iter().any(|f| f.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn analyze_source(src: &str) -> AnalysisResult {
        let (module, parse_diags) = parse(src);
        assert!(parse_diags.is_empty(), "unexpected parse diagnostics: {parse_diags:?}");
        analyze(&module)
    }

    #[test]
    fn resolves_extends_and_ancestors() {
        let result = analyze_source("sig A {} sig B extends A {}");
        assert!(result.diagnostics.is_empty());
        let a = result.symbols.sig_named("A").unwrap();
        let b = result.symbols.sig_named("B").unwrap();
        assert!(result.symbols.extends(b, a));
    }

    #[test]
    fn flags_duplicate_signature_names() {
        let result = analyze_source("sig A {} sig A {}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E_DUP_SIG"));
    }

    #[test]
    fn flags_undefined_extends_target() {
        let result = analyze_source("sig A extends Ghost {}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E_UNDEF_SIG"));
    }

    #[test]
    fn flags_inheritance_cycles() {
        let result = analyze_source("sig A extends B {} sig B extends A {}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E_EXTENDS_CYCLE"));
    }

    #[test]
    fn flags_undefined_names_in_fact_bodies() {
        let result = analyze_source("sig A {} fact { no Ghost }");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E_UNDEF_NAME"));
    }

    #[test]
    fn quantifier_bound_names_are_in_scope() {
        let result = analyze_source("sig A {} fact { all x: A | some x }");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn flags_undefined_command_targets() {
        let result = analyze_source("sig A {} run Ghost");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E_UNDEF_COMMAND_TARGET"));
    }

    #[test]
    fn resolves_named_command_targets() {
        let result = analyze_source("sig A {} pred p { some A } run p");
        assert!(result
            .diagnostics
            .iter()
            .all(|d| d.code != "E_UNDEF_COMMAND_TARGET"));
    }
}
