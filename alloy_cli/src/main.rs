mod args;

use clap::Parser;

use alloy_lang::command::{CommandRunner, ExtractedInstance, PipelineOutcome};
use alloy_lang::config::EngineConfig;
use alloy_lang::instance::Instance;
use alloy_sat::config::Config;
use alloy_sat::context::Context;
use alloy_sat::reports::Report;

use args::{Cli, CliCommand, DimacsArgs, RunArgs};

fn main() {
    let cli = Cli::parse();

    let verbosity = match &cli.command {
        CliCommand::Run(a) => a.verbose,
        CliCommand::Dimacs(a) => a.verbose,
    };
    init_logging(verbosity);

    let code = match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Dimacs(args) => dimacs(args),
    };
    std::process::exit(code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: RunArgs) -> i32 {
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", args.file.display());
            return 2;
        }
    };

    let mut config = EngineConfig::default();
    if let Some(scope) = args.scope {
        config.default_scope = scope;
    }
    if let Some(steps) = args.steps {
        config.default_steps = steps;
    }

    let outcome = CommandRunner::run_with_config(&source, args.command.as_deref(), &config);
    report_diagnostics(&outcome);

    match outcome.report {
        None => 1,
        Some(Report::Satisfiable) => {
            println!("SAT");
            if let Some(instance) = &outcome.instance {
                print_instance(instance);
            }
            print_statistics(&outcome);
            0
        }
        Some(Report::Unsatisfiable) => {
            println!("UNSAT");
            print_statistics(&outcome);
            0
        }
        Some(Report::Unknown) => {
            eprintln!("error: solver returned an indeterminate result");
            2
        }
    }
}

fn report_diagnostics(outcome: &PipelineOutcome) {
    for diagnostic in &outcome.diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn print_instance(instance: &ExtractedInstance) {
    match instance {
        ExtractedInstance::Plain(inst) => print_plain_instance(inst, None),
        ExtractedInstance::Temporal(trace) => {
            for (state, inst) in trace.states.iter().enumerate() {
                print_plain_instance(inst, Some(state));
            }
            println!("loop back to state {}", trace.loop_state);
        }
    }
}

fn print_plain_instance(instance: &Instance, state: Option<usize>) {
    match state {
        Some(s) => println!("-- state {s} --"),
        None => println!("-- instance --"),
    }
    for (name, tuples) in &instance.relations {
        let rendered: Vec<String> = tuples
            .iter()
            .map(|tuple| {
                let atoms: Vec<&str> = tuple.iter().map(|atom| instance.universe[*atom].as_str()).collect();
                format!("({})", atoms.join("->"))
            })
            .collect();
        println!("{name} = {{{}}}", rendered.join(", "));
    }
}

fn print_statistics(outcome: &PipelineOutcome) {
    if let Some(stats) = &outcome.statistics {
        println!(
            "c decisions={} propagations={} conflicts={} learned={} restarts={} deleted={} solve_time_ms={}",
            stats.decisions, stats.propagations, stats.conflicts, stats.learned_clauses, stats.restarts, stats.deleted_clauses, stats.solve_time_ms
        );
    }
}

fn dimacs(args: DimacsArgs) -> i32 {
    let contents = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", args.file.display());
            return 2;
        }
    };

    let mut ctx = Context::from_config(Config::default());
    if let Err(err) = ctx.read_dimacs(contents.as_bytes()) {
        eprintln!("error: malformed DIMACS input: {err:?}");
        return 2;
    }

    match ctx.solve() {
        Ok(Report::Satisfiable) => {
            println!("SAT");
            0
        }
        Ok(Report::Unsatisfiable) => {
            println!("UNSAT");
            0
        }
        Ok(Report::Unknown) => {
            eprintln!("error: solver returned an indeterminate result");
            2
        }
        Err(err) => {
            eprintln!("error: internal solver error: {err:?}");
            2
        }
    }
}
