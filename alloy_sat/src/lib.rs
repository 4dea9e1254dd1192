/*!
A conflict-driven clause-learning SAT solver.

This library decides the satisfiability of boolean formulas in conjunctive
normal form, built up as a collection of [clauses](structures::clause)
over [atoms](structures::Atom), using two-watched-literal unit propagation,
first-UIP conflict analysis with non-chronological backtracking, VSIDS
branching, and Luby-scheduled restarts.

# Orientation

A solve is driven through a [Context](context::Context):

- Clauses are added either [programmatically](context::Context::add_clause)
  or by [reading a DIMACS document](dimacs).
- [Context::solve](context::Context::solve) runs the CDCL loop described in
  [procedures::solve] to completion (or until cancelled / a time limit
  elapses), returning a [Report](reports::Report).
- [Context::report](context::Context::report) and
  [Context::statistics](context::Context::statistics) describe the outcome
  once a solve has run.

Internally, a solve reads from and writes to a handful of databases:

- The [clause database](db::clause) stores the formula (original and
  learned clauses) and the watcher lists unit propagation relies on.
- The [atom database](db::atom) stores the current valuation, saved phases,
  and the VSIDS activity heap.
- The [trail](db::trail) records assignments in the order they were made,
  annotated with the decision level and reason each was made for.

# Example

```rust
use alloy_sat::config::Config;
use alloy_sat::context::Context;
use alloy_sat::reports::Report;
use alloy_sat::structures::literal::Literal;

let mut ctx = Context::from_config(Config::default());
let p = ctx.fresh_atom();
let q = ctx.fresh_atom();

ctx.add_clause(vec![Literal::new(p, false), Literal::new(q, true)]).unwrap();
ctx.add_clause(vec![Literal::new(p, true), Literal::new(q, false)]).unwrap();

assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
assert_eq!(ctx.atom_db.value_of(p), ctx.atom_db.value_of(q));
```
*/

pub mod config;
pub mod context;
pub mod db;
pub mod dimacs;
pub mod generic;
pub mod procedures;
pub mod reports;
pub mod structures;
pub mod types;
