/*!
Front end, relational encoder, and command pipeline for the Alloy 6
modeling language.

A source file runs through the same pipeline [`command::CommandRunner`]
drives end to end:

- [`lexer`] and [`parser`] turn source text into an [`ast::Module`], both
  accumulating recoverable [`diagnostic::Diagnostic`]s rather than aborting
  on the first problem.
- [`analysis`] builds the [`symbols::SymbolTable`], resolves names, and
  checks the structural well-formedness rules in its own module doc.
- [`universe`], [`tuples`], and [`bounds`] give each signature and field a
  concrete set of atoms to range over.
- [`formula`] and [`matrix`] lower set-valued and formula-valued
  expressions to [`alloy_sat`] clauses.
- [`encoder`] (for a plain model) or [`trace`] (for a temporal one) drives
  that lowering over the parsed module.
- [`instance`] reads a solved [`alloy_sat::context::Context`] back out as
  a concrete instance or trace.

Diagnostics are data, never control flow (§7 of the language this targets):
a stage that finds a problem keeps going and lets the caller decide, via
[`diagnostic::has_errors`], whether to trust the result.
*/

pub mod analysis;
pub mod ast;
pub mod bounds;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod encoder;
pub mod error;
pub mod formula;
pub mod instance;
pub mod lexer;
pub mod matrix;
pub mod parser;
pub mod report;
pub mod source;
pub mod symbols;
pub mod token;
pub mod trace;
pub mod tuples;
pub mod universe;
