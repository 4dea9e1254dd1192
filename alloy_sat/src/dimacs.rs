/*!
Reading and writing the DIMACS CNF interchange format.

```text
c a comment
p cnf 4 3
 1 -2  0
 2  3  0
-3  4  0
```

Atoms named `1..=atom_count` in the file are mapped onto freshly allocated
atoms in the context, in the order first encountered; the mapping is
returned so callers can translate a reported valuation back into DIMACS
numbering.
*/

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::context::Context;
use crate::structures::literal::Literal;
use crate::structures::Atom;
use crate::types::err::{self, ErrorKind};

impl Context {
    /// Reads a DIMACS CNF document, adding its clauses to the context.
    /// Returns the mapping from DIMACS atom numbers to the atoms allocated
    /// for them.
    pub fn read_dimacs(&mut self, mut reader: impl BufRead) -> Result<HashMap<i64, Atom>, ErrorKind> {
        let mut atom_map: HashMap<i64, Atom> = HashMap::new();
        let mut buffer = String::with_capacity(1024);
        let mut line_counter = 0usize;

        'preamble: loop {
            buffer.clear();
            match reader.read_line(&mut buffer) {
                Ok(0) => break 'preamble,
                Ok(_) => line_counter += 1,
                Err(_) => return Err(err::ParseError::Line(line_counter).into()),
            }

            match buffer.chars().next() {
                Some('c') => continue,
                Some('p') => {
                    let mut fields = buffer.split_whitespace();
                    let _atom_count: usize = fields
                        .nth(2)
                        .and_then(|s| s.parse().ok())
                        .ok_or(err::ParseError::ProblemSpecification)?;
                    let _clause_count: usize = fields
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or(err::ParseError::ProblemSpecification)?;
                    break 'preamble;
                }
                _ => break 'preamble,
            }
        }

        let mut clause_buffer: Vec<Literal> = Vec::new();

        loop {
            buffer.clear();
            match reader.read_line(&mut buffer) {
                Ok(0) => break,
                Ok(_) => line_counter += 1,
                Err(_) => return Err(err::ParseError::Line(line_counter).into()),
            }

            match buffer.chars().next() {
                Some('%') => break,
                Some('c') => continue,
                _ => {
                    for token in buffer.split_whitespace() {
                        if token == "0" {
                            let clause = std::mem::take(&mut clause_buffer);
                            self.add_clause(clause)?;
                            continue;
                        }

                        let parsed: i64 = token
                            .parse()
                            .map_err(|_| err::ParseError::Line(line_counter))?;
                        let dimacs_atom = parsed.abs();
                        let atom = *atom_map.entry(dimacs_atom).or_insert_with(|| self.fresh_atom());
                        let literal = Literal::new(atom, parsed > 0);
                        if !clause_buffer.contains(&literal) {
                            clause_buffer.push(literal);
                        }
                    }
                }
            }
        }

        Ok(atom_map)
    }

    /// Writes every original clause in the context as a DIMACS CNF document.
    pub fn write_dimacs(&self, mut writer: impl Write) -> std::io::Result<()> {
        writeln!(
            writer,
            "p cnf {} {}",
            self.atom_db.atom_count(),
            self.clause_db.original_count()
        )?;
        for clause in self.clause_db.original_clauses() {
            writeln!(writer, "{}", clause.as_dimacs())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn reads_clauses_and_maps_atoms_in_first_seen_order() {
        let mut ctx = Context::from_config(Config::default());
        let dimacs = b"c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n";
        let map = ctx.read_dimacs(&dimacs[..]).unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(ctx.clause_db.original_count(), 2);
    }

    #[test]
    fn write_then_read_round_trips_clause_count() {
        let mut ctx = Context::from_config(Config::default());
        let p = ctx.fresh_atom();
        let q = ctx.fresh_atom();
        ctx.add_clause(vec![Literal::new(p, true), Literal::new(q, false)])
            .unwrap();

        let mut out = Vec::new();
        ctx.write_dimacs(&mut out).unwrap();

        let mut reread = Context::from_config(Config::default());
        reread.read_dimacs(out.as_slice()).unwrap();
        assert_eq!(reread.clause_db.original_count(), 1);
    }
}
