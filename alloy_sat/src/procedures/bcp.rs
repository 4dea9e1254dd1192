/*!
Boolean constraint propagation via two-watched literals.

# Overview

When a literal `l` is enqueued (becomes true), every clause watching `¬l`
must be checked: that clause can no longer rely on `¬l` to keep it
undetermined. For each such clause:

1. If the clause's other watched literal is already true, the clause is
   satisfied regardless and the watch is left alone.
2. Otherwise, scan positions `[2, len)` for a literal that is not currently
   false. If one is found, it becomes the new watch (swapped into the
   position `¬l` occupied) and the clause moves off `¬l`'s watcher list.
3. If no such literal is found, the clause is unit on its remaining watched
   literal: enqueue it (with this clause as the reason), or, if that
   literal is also false, report a conflict.

This is exactly the scheme described in the specification this library
implements: "ensure the falsified literal is at position 1; if position 0 is
already true, keep the watch; otherwise search positions `[2, size)` ...".
*/

use crate::context::Context;
use crate::db::trail::Reason;
use crate::db::ClauseKey;
use crate::structures::literal::Literal;
use crate::types::err::{self, BCPError};

impl Context {
    /// Propagates every literal queued on the trail until the queue is
    /// exhausted or a conflict is found.
    pub fn propagate(&mut self) -> Result<(), BCPError> {
        while let Some(literal) = self.trail.next_to_propagate() {
            self.propagate_literal(literal)?;
            self.trail.advance_propagate_head();
        }
        Ok(())
    }

    /// Processes the consequences of `literal` becoming true: re-examines
    /// every clause watching its negation.
    ///
    /// A read/write cursor walks the watcher list in place: `retained` holds
    /// the watchers (of `watched`) decided so far, and on conflict the
    /// undecided tail of the original list is appended back untouched, so no
    /// watcher is silently dropped.
    fn propagate_literal(&mut self, literal: Literal) -> Result<(), BCPError> {
        let watched = literal.negate();
        let watchers = self.clause_db.watchers_of(watched);

        let mut retained = Vec::with_capacity(watchers.len());

        for (cursor, key) in watchers.iter().enumerate() {
            let key = *key;
            let clause = match self.clause_db.get_mut(&key) {
                Ok(c) => c,
                Err(_) => continue,
            };

            // Ensure the falsified literal sits at position 1.
            if clause.literal_at(0) == Some(watched) {
                clause.swap(0, 1);
            }

            // If position 0 already holds a satisfied literal, the clause is
            // fine; keep the current watch in place.
            if let Some(other) = clause.literal_at(0) {
                if self.atom_db.value_of(other.atom()) == Some(other.polarity()) {
                    retained.push(key);
                    continue;
                }
            }

            // Search for a new literal to watch.
            let mut new_watch = None;
            for idx in 2..clause.len() {
                let candidate = clause.literal_at(idx).unwrap();
                if self.atom_db.value_of(candidate.atom()) != Some(!candidate.polarity()) {
                    new_watch = Some(idx);
                    break;
                }
            }

            match new_watch {
                Some(idx) => {
                    clause.swap(1, idx);
                    let new_lit = clause.literal_at(1).unwrap();
                    self.clause_db.add_watcher(new_lit.negate(), key);
                }
                None => {
                    // Unit (or conflicting) on position 0.
                    let unit = clause.literal_at(0).unwrap();
                    retained.push(key);

                    match self.atom_db.value_of(unit.atom()) {
                        Some(v) if v != unit.polarity() => {
                            // Conflict: the remaining, not-yet-examined
                            // watchers are preserved unchanged.
                            retained.extend_from_slice(&watchers[cursor + 1..]);
                            self.clause_db.set_watchers_of(watched, retained);
                            return Err(BCPError::Conflict(key));
                        }
                        Some(_) => {}
                        None => {
                            self.enqueue(unit, Reason::Propagation(key));
                        }
                    }
                }
            }
        }

        self.clause_db.set_watchers_of(watched, retained);
        Ok(())
    }

    /// Enqueues `literal` as true, for the given reason, at the current
    /// decision level.
    pub fn enqueue(&mut self, literal: Literal, reason: Reason) {
        // Mirrors the level `Trail::push_decision`/`push_propagated` is about
        // to compute internally, so the atom database and the trail always
        // agree on an atom's decision level. A decision bumps the level by
        // one; a propagation stays at the current level.
        let level = match reason {
            Reason::Decision => self.trail.current_level() + 1,
            Reason::Propagation(_) => self.trail.current_level(),
        };
        self.atom_db.assign(literal.atom(), literal.polarity(), level);
        match reason {
            Reason::Decision => self.trail.push_decision(literal),
            Reason::Propagation(key) => self.trail.push_propagated(literal, key),
        }
        self.counters.propagations += 1;
    }

    /// Propagates until exhaustion, mapping a conflict into an `ErrorKind`
    /// the caller can match on directly (used for the very first BCP sweep,
    /// before any decision has been made, where a conflict means the
    /// original formula is unsatisfiable).
    pub fn propagate_queue(&mut self) -> Result<(), err::ErrorKind> {
        match self.propagate() {
            Ok(()) => Ok(()),
            Err(BCPError::Conflict(key)) => {
                self.note_conflict(key);
                Err(err::ErrorKind::FundamentalConflict)
            }
        }
    }
}
