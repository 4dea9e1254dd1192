//! Shared scaffolding for the black-box scenario tests in `tests/*.rs`.

use alloy_lang::command::{CommandRunner, ExtractedInstance, PipelineOutcome};
use alloy_lang::config::EngineConfig;
use alloy_lang::instance::Instance;
use alloy_sat::reports::Report;

/// Runs the first (or named) command in `source` with engine defaults.
pub fn run(source: &str) -> PipelineOutcome {
    CommandRunner::run(source, None)
}

pub fn run_named(source: &str, command: &str) -> PipelineOutcome {
    CommandRunner::run(source, Some(command))
}

pub fn run_with_config(source: &str, config: &EngineConfig) -> PipelineOutcome {
    CommandRunner::run_with_config(source, None, config)
}

/// Asserts the pipeline reached a decided `SAT` verdict and returns the
/// plain instance it extracted.
pub fn expect_sat(outcome: &PipelineOutcome) -> &Instance {
    assert_eq!(outcome.report, Some(Report::Satisfiable), "diagnostics: {:?}", outcome.diagnostics);
    match outcome.instance.as_ref().expect("a satisfiable outcome always carries an instance") {
        ExtractedInstance::Plain(instance) => instance,
        ExtractedInstance::Temporal(_) => panic!("expected a plain instance, got a trace"),
    }
}

/// Asserts the pipeline reached a decided `SAT` verdict over a `var` model
/// and returns the temporal trace it extracted.
pub fn expect_sat_trace(outcome: &PipelineOutcome) -> &alloy_lang::instance::TemporalInstance {
    assert_eq!(outcome.report, Some(Report::Satisfiable), "diagnostics: {:?}", outcome.diagnostics);
    match outcome.instance.as_ref().expect("a satisfiable outcome always carries an instance") {
        ExtractedInstance::Temporal(trace) => trace,
        ExtractedInstance::Plain(_) => panic!("expected a trace, got a plain instance"),
    }
}

pub fn expect_unsat(outcome: &PipelineOutcome) {
    assert_eq!(outcome.report, Some(Report::Unsatisfiable), "diagnostics: {:?}", outcome.diagnostics);
    assert!(outcome.instance.is_none());
}

pub fn expect_model_errors(outcome: &PipelineOutcome) {
    assert!(outcome.report.is_none(), "expected no report, got {:?}", outcome.report);
    assert!(!outcome.diagnostics.is_empty());
}
