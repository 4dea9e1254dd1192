//! The command runner (C12): the one entry point that ties lexing through
//! instance extraction into a single call, per the external surface a host
//! application drives.

use std::collections::HashMap;

use alloy_sat::config::Config;
use alloy_sat::context::Context;
use alloy_sat::reports::Report;

use crate::analysis;
use crate::ast::{CommandTarget, ExprNode, Module, Scope};
use crate::bounds::{Bounds, BoundsBuilder};
use crate::config::EngineConfig;
use crate::diagnostic::{self, Diagnostic};
use crate::encoder::{Encoder, RelationalEnvironment};
use crate::formula::CnfBuilder;
use crate::instance::{extract_instance, extract_trace, Instance, TemporalInstance};
use crate::parser;
use crate::report::Statistics;
use crate::symbols::{SigId, SymbolTable};
use crate::trace::{build_trace_environment, TraceSkeleton};
use crate::tuples::{Tuple, TupleSet};
use crate::universe::{AtomId, Universe};

/// Either shape an extracted instance can take, depending on whether the
/// resolved command's model used any `var` relation.
#[derive(Clone, Debug)]
pub enum ExtractedInstance {
    Plain(Instance),
    Temporal(TemporalInstance),
}

/// What a full `run`/`check` invocation produced. Diagnostics are always
/// present; everything past them is only populated once the model was
/// accepted and a command was actually encoded.
#[derive(Clone, Debug, Default)]
pub struct PipelineOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub report: Option<Report>,
    pub instance: Option<ExtractedInstance>,
    pub statistics: Option<Statistics>,
}

impl PipelineOutcome {
    fn model_errors(diagnostics: Vec<Diagnostic>) -> Self {
        PipelineOutcome {
            diagnostics,
            ..Default::default()
        }
    }
}

pub struct CommandRunner;

impl CommandRunner {
    /// Runs the named command (or the module's first command, if
    /// `command_name` is `None`) against `source`.
    pub fn run(source: &str, command_name: Option<&str>) -> PipelineOutcome {
        Self::run_with_config(source, command_name, &EngineConfig::default())
    }

    pub fn run_with_config(source: &str, command_name: Option<&str>, config: &EngineConfig) -> PipelineOutcome {
        let (module, parse_diags) = parser::parse(source);
        let analysis = analysis::analyze(&module);

        let mut diagnostics = parse_diags;
        diagnostics.extend(analysis.diagnostics.clone());
        if diagnostic::has_errors(&diagnostics) {
            log::warn!("model has errors, refusing to run a command");
            return PipelineOutcome::model_errors(diagnostics);
        }

        let command_index = match resolve_command(&module, command_name) {
            Some(idx) => idx,
            None => {
                diagnostics.push(Diagnostic::error(
                    "E_NO_SUCH_COMMAND",
                    format!("no command named '{}'", command_name.unwrap_or("<default>")),
                    crate::source::Span::point(crate::source::Position::start()),
                ));
                return PipelineOutcome::model_errors(diagnostics);
            }
        };
        let command = &module.commands[command_index];
        log::info!("command resolved to index {command_index}");

        let (universe, bounds) = build_universe_and_bounds(&module, &analysis.symbols, &command.scope, config);
        let length = command.scope.steps.unwrap_or(config.default_steps) as usize;
        let has_var_relations = analysis.symbols.sigs.iter().any(|s| s.var) || analysis.symbols.sigs.iter().any(|s| s.fields.iter().any(|f| f.var));

        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let relation_names: Vec<String> = bounds.names().cloned().collect();

        let target = encoder_target(&module, command);
        let (env, loop_lits) = if has_var_relations {
            let env = build_trace_environment(&bounds, &analysis.symbols, &universe, length.max(1), &mut builder);
            let skeleton = match TraceSkeleton::build(length.max(1), &mut builder) {
                Ok(s) => s,
                Err(err) => return solver_internal_error(diagnostics, err),
            };
            let mut encoder = Encoder::new(&module, &analysis.symbols, env.clone(), universe.clone(), &mut builder, config.int_bit_width)
                .with_trace(length.max(1), skeleton.loop_lits.clone());
            if let Err(err) = assert_target(&module, target, &mut encoder) {
                return encoding_error(diagnostics, err);
            }
            (env, Some(skeleton.loop_lits))
        } else {
            let env = plain_environment(&bounds, &universe, &mut builder);
            let mut encoder = Encoder::new(&module, &analysis.symbols, env.clone(), universe.clone(), &mut builder, config.int_bit_width);
            if let Err(err) = assert_target(&module, target, &mut encoder) {
                return encoding_error(diagnostics, err);
            }
            (env, None)
        };

        let mut ctx = builder.into_context();
        let report = match ctx.solve() {
            Ok(r) => r,
            Err(err) => return solver_internal_error(diagnostics, err),
        };
        let statistics = ctx.statistics();

        let instance = if report == Report::Satisfiable {
            match loop_lits {
                Some(lits) => Some(ExtractedInstance::Temporal(extract_trace(&ctx, &env, &universe, &relation_names, &lits, length.max(1)))),
                None => Some(ExtractedInstance::Plain(extract_instance(&ctx, &env, &universe, &relation_names))),
            }
        } else {
            None
        };

        PipelineOutcome {
            diagnostics,
            report: Some(report),
            instance,
            statistics: Some(statistics),
        }
    }
}

fn plain_environment(bounds: &Bounds, universe: &Universe, builder: &mut CnfBuilder) -> RelationalEnvironment {
    let mut env = RelationalEnvironment::new();
    for name in bounds.names() {
        let bound = bounds.get(name).expect("name came from bounds.names()");
        let matrix = crate::matrix::BoolMatrix::from_bounds(bound, universe.len(), builder);
        env.insert(name.clone(), vec![matrix]);
    }
    env
}

fn encoder_target(module: &Module, command: &crate::ast::Command) -> crate::ast::ExprId {
    match &command.target {
        CommandTarget::Body(body) => *body,
        CommandTarget::Named(name) => module
            .preds
            .iter()
            .find(|p| &p.name == name)
            .map(|p| p.body)
            .or_else(|| module.funs.iter().find(|f| &f.name == name).map(|f| f.body))
            .or_else(|| module.asserts.iter().find(|a| a.name.as_deref() == Some(name.as_str())).map(|a| a.body))
            .unwrap_or_else(|| module.facts.first().map(|f| f.body).unwrap_or(0)),
    }
}

fn assert_target(module: &Module, target: crate::ast::ExprId, encoder: &mut Encoder) -> Result<(), crate::error::EncodingError> {
    for fact in &module.facts {
        encoder.assert_fact(fact.body)?;
    }
    encoder.assert_fact(target)
}

fn resolve_command(module: &Module, command_name: Option<&str>) -> Option<usize> {
    match command_name {
        Some(name) => module.commands.iter().position(|c| c.name.as_deref() == Some(name)),
        None => {
            if module.commands.is_empty() {
                None
            } else {
                Some(0)
            }
        }
    }
}

fn solver_internal_error(mut diagnostics: Vec<Diagnostic>, err: alloy_sat::types::err::ErrorKind) -> PipelineOutcome {
    log::warn!("internal solver error: {err:?}");
    diagnostics.push(Diagnostic::error(
        "E_SOLVER_INTERNAL",
        format!("internal solver error: {err:?}"),
        crate::source::Span::point(crate::source::Position::start()),
    ));
    PipelineOutcome::model_errors(diagnostics)
}

fn encoding_error(mut diagnostics: Vec<Diagnostic>, err: crate::error::EncodingError) -> PipelineOutcome {
    log::warn!("internal encoding error: {err}");
    diagnostics.push(Diagnostic::error(
        "E_ENCODING_INTERNAL",
        format!("internal encoding error: {err}"),
        crate::source::Span::point(crate::source::Position::start()),
    ));
    PipelineOutcome::model_errors(diagnostics)
}

/// Builds a universe of synthetic atoms, one block per signature sized per
/// the command's scope, then computes every signature's bound (its own
/// atoms plus every descendant's, the way `extends` partitions a universe)
/// and every field's bound (the owning signature's extension joined against
/// each column the field's declared type names).
fn build_universe_and_bounds(module: &Module, symbols: &SymbolTable, scope: &Scope, config: &EngineConfig) -> (Universe, Bounds) {
    let mut children: HashMap<SigId, Vec<SigId>> = HashMap::new();
    for (id, sig) in symbols.sigs.iter().enumerate() {
        if let Some(parent) = sig.parent {
            children.entry(parent).or_default().push(id);
        }
    }

    let mut names = Vec::new();
    let mut own_atoms: HashMap<SigId, Vec<AtomId>> = HashMap::new();
    let mut next_atom: AtomId = 0;
    for (id, sig) in symbols.sigs.iter().enumerate() {
        if sig.abstract_ {
            own_atoms.insert(id, Vec::new());
            continue;
        }
        let count = scope_for(&sig.name, scope, sig.multiplicity, config);
        let block: Vec<AtomId> = (0..count).map(|i| next_atom + i as AtomId).collect();
        next_atom += count as AtomId;
        for i in block.iter() {
            names.push(format!("{}${}", sig.name, i));
        }
        own_atoms.insert(id, block);
    }
    let universe = Universe::new(names);

    let mut extension_cache: HashMap<SigId, Vec<AtomId>> = HashMap::new();
    for id in 0..symbols.sigs.len() {
        compute_extension(id, &own_atoms, &children, &mut extension_cache);
    }

    let mut builder = BoundsBuilder::new();
    for (id, sig) in symbols.sigs.iter().enumerate() {
        let extension = extension_cache.get(&id).cloned().unwrap_or_default();
        builder = builder.exact(sig.name.clone(), TupleSet::from_iter(1, extension.into_iter().map(|a| vec![a])));
    }
    for (id, sig) in symbols.sigs.iter().enumerate() {
        for field in &sig.fields {
            let mut columns = vec![extension_cache.get(&id).cloned().unwrap_or_default()];
            columns.extend(collect_domain_columns(module, symbols, field.type_expr, &extension_cache, universe.len()));
            let qualified = format!("{}.{}", sig.name, field.name);
            builder = builder.upper(qualified, domain_tuples(&columns));
        }
    }

    (universe, builder.build())
}

fn scope_for(name: &str, scope: &Scope, multiplicity: Option<crate::ast::Multiplicity>, _config: &EngineConfig) -> usize {
    if matches!(multiplicity, Some(crate::ast::Multiplicity::One)) {
        return 1;
    }
    scope
        .per_sig
        .iter()
        .find(|s| s.signature == name)
        .map(|s| s.bound as usize)
        .unwrap_or(scope.default_scope as usize)
}

fn compute_extension(id: SigId, own: &HashMap<SigId, Vec<AtomId>>, children: &HashMap<SigId, Vec<SigId>>, cache: &mut HashMap<SigId, Vec<AtomId>>) -> Vec<AtomId> {
    if let Some(existing) = cache.get(&id) {
        return existing.clone();
    }
    let mut result = own.get(&id).cloned().unwrap_or_default();
    if let Some(kids) = children.get(&id) {
        for &child in kids {
            result.extend(compute_extension(child, own, children, cache));
        }
    }
    cache.insert(id, result.clone());
    result
}

/// Walks a field's declared type expression collecting, left to right, the
/// atom set each arrow column ranges over. A leaf this walk doesn't
/// recognize (an expression more complex than a bare signature name or an
/// arrow chain of them) contributes the whole universe for that column --
/// a conservative upper bound, never a wrong one.
fn collect_domain_columns(module: &Module, symbols: &SymbolTable, expr: crate::ast::ExprId, extension: &HashMap<SigId, Vec<AtomId>>, universe_size: usize) -> Vec<Vec<AtomId>> {
    match module.expr(expr) {
        ExprNode::Ident(name) => {
            if let Some(id) = symbols.sig_named(name) {
                vec![extension.get(&id).cloned().unwrap_or_default()]
            } else {
                vec![(0..universe_size as AtomId).collect()]
            }
        }
        ExprNode::Arrow { left, right, .. } => {
            let mut cols = collect_domain_columns(module, symbols, *left, extension, universe_size);
            cols.extend(collect_domain_columns(module, symbols, *right, extension, universe_size));
            cols
        }
        _ => vec![(0..universe_size as AtomId).collect()],
    }
}

fn domain_tuples(columns: &[Vec<AtomId>]) -> TupleSet {
    let arity = columns.len();
    let mut acc: Vec<Tuple> = vec![Vec::new()];
    for col in columns {
        let mut next = Vec::with_capacity(acc.len() * col.len());
        for prefix in &acc {
            for &atom in col {
                let mut t = prefix.clone();
                t.push(atom);
                next.push(t);
            }
        }
        acc = next;
    }
    TupleSet::from_iter(arity, acc.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_satisfiable_model_reports_sat_with_an_instance() {
        let outcome = CommandRunner::run("sig A {} fact { some A } run {} for 2", None);
        assert!(outcome.diagnostics.iter().all(|d| d.severity != crate::diagnostic::Severity::Error));
        assert_eq!(outcome.report, Some(Report::Satisfiable));
    }

    #[test]
    fn an_unsatisfiable_model_is_reported_without_an_instance() {
        let outcome = CommandRunner::run("sig A {} fact { some A and no A } run {} for 2", None);
        assert_eq!(outcome.report, Some(Report::Unsatisfiable));
        assert!(outcome.instance.is_none());
    }

    #[test]
    fn a_model_with_semantic_errors_never_reaches_the_solver() {
        let outcome = CommandRunner::run("sig A {} fact { some Nonexistent } run {} for 2", None);
        assert!(diagnostic::has_errors(&outcome.diagnostics));
        assert!(outcome.report.is_none());
    }
}
