/*!
The clause database: storage for original and learned clauses, plus the
per-literal watcher lists the two-watched-literal scheme relies on.

Original and learned clauses are stored in separate, densely-indexed vectors
and addressed through a [ClauseKey] so that reduction of the learned set
never invalidates an original clause's key.
*/

use std::collections::HashMap;

use super::ClauseKey;
use crate::config::ClauseDBConfig;
use crate::structures::clause::Clause;
use crate::structures::literal::Literal;
use crate::types::err::{self, ErrorKind};

/// The clause database.
pub struct ClauseDB {
    original: Vec<Clause>,
    learned: Vec<Clause>,
    /// For each literal code, the clauses that watch its negation becoming true.
    watchers: HashMap<usize, Vec<ClauseKey>>,
    config: ClauseDBConfig,
    bump: f64,
    pub deleted_count: u64,
}

impl ClauseDB {
    pub fn new(config: ClauseDBConfig) -> Self {
        ClauseDB {
            original: Vec::new(),
            learned: Vec::new(),
            watchers: HashMap::new(),
            config,
            bump: 1.0,
            deleted_count: 0,
        }
    }

    pub fn get(&self, key: &ClauseKey) -> Result<&Clause, ErrorKind> {
        match key {
            ClauseKey::Original(i) => self
                .original
                .get(*i as usize)
                .ok_or(err::ClauseDBError::Missing.into()),
            ClauseKey::Learned(i) => self
                .learned
                .get(*i as usize)
                .ok_or(err::ClauseDBError::Missing.into()),
        }
    }

    pub fn get_mut(&mut self, key: &ClauseKey) -> Result<&mut Clause, ErrorKind> {
        match key {
            ClauseKey::Original(i) => self
                .original
                .get_mut(*i as usize)
                .ok_or(err::ClauseDBError::Missing.into()),
            ClauseKey::Learned(i) => self
                .learned
                .get_mut(*i as usize)
                .ok_or(err::ClauseDBError::Missing.into()),
        }
    }

    /// Registers the two watches of a freshly-stored clause (its literals at
    /// index 0 and 1, or its only literal twice-over if unit).
    fn watch(&mut self, key: ClauseKey, clause: &Clause) {
        let lits = clause.literals();
        if lits.is_empty() {
            return;
        }
        let watch_count = lits.len().min(2);
        for lit in &lits[..watch_count] {
            self.watchers
                .entry(lit.negate().code())
                .or_default()
                .push(key);
        }
    }

    /// Stores an original clause, returning its key. An empty clause is
    /// rejected --- callers should detect that case (unsatisfiability)
    /// before reaching the clause database.
    pub fn add_original(&mut self, literals: Vec<Literal>) -> Result<ClauseKey, ErrorKind> {
        if literals.is_empty() {
            return Err(err::ClauseDBError::EmptyClause.into());
        }
        let key = ClauseKey::Original(self.original.len() as u32);
        let clause = Clause::original(literals);
        self.watch(key, &clause);
        self.original.push(clause);
        Ok(key)
    }

    /// Stores a learned clause, returning its key.
    pub fn add_learned(&mut self, literals: Vec<Literal>, lbd: u32) -> ClauseKey {
        let key = ClauseKey::Learned(self.learned.len() as u32);
        let clause = Clause::learned(literals, lbd);
        self.watch(key, &clause);
        self.learned.push(clause);
        key
    }

    /// The watcher list for clauses watching `literal`'s negation, i.e. the
    /// clauses to examine when `literal` becomes true.
    pub fn watchers_of(&self, literal: Literal) -> Vec<ClauseKey> {
        self.watchers.get(&literal.code()).cloned().unwrap_or_default()
    }

    /// Replaces the watcher list for `literal`.
    pub fn set_watchers_of(&mut self, literal: Literal, keys: Vec<ClauseKey>) {
        self.watchers.insert(literal.code(), keys);
    }

    pub fn add_watcher(&mut self, literal: Literal, key: ClauseKey) {
        self.watchers.entry(literal.code()).or_default().push(key);
    }

    pub fn learned_count(&self) -> usize {
        self.learned.len()
    }

    pub fn original_count(&self) -> usize {
        self.original.len()
    }

    pub fn original_clauses(&self) -> &[Clause] {
        &self.original
    }

    pub fn config(&self) -> &ClauseDBConfig {
        &self.config
    }

    /// Bumps a learned clause's activity, rescaling the whole learned set if
    /// the bump amount grows too large.
    pub fn bump_learned_activity(&mut self, key: ClauseKey) {
        if let ClauseKey::Learned(_) = key {
            if let Ok(clause) = self.get_mut(&key) {
                clause.bump_activity(self.bump);
                if clause.activity() > 1e100 {
                    for c in self.learned.iter_mut() {
                        c.rescale_activity(1e-100);
                    }
                    self.bump *= 1e-100;
                }
            }
        }
    }

    pub fn decay_clause_activity(&mut self) {
        self.bump /= self.config.clause_db_decay();
    }

    /// Deletes the lower half (by activity) of learned clauses not currently
    /// serving as a propagation reason, keyed by the set of `protected` keys
    /// the caller has determined are in use. Rebuilds watcher lists
    /// afterwards, since deletion changes which learned index a key refers to.
    ///
    /// Returns the number of clauses deleted.
    pub fn reduce(&mut self, protected: &std::collections::HashSet<ClauseKey>) -> usize {
        let mut indices: Vec<usize> = (0..self.learned.len())
            .filter(|i| !protected.contains(&ClauseKey::Learned(*i as u32)))
            .collect();
        indices.sort_by(|&a, &b| {
            self.learned[a]
                .activity()
                .partial_cmp(&self.learned[b].activity())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let to_delete: std::collections::HashSet<usize> =
            indices.into_iter().take(self.learned.len() / 2).collect();

        if to_delete.is_empty() {
            return 0;
        }

        let kept: Vec<Clause> = self
            .learned
            .drain(..)
            .enumerate()
            .filter(|(i, _)| !to_delete.contains(i))
            .map(|(_, c)| c)
            .collect();
        self.deleted_count += to_delete.len() as u64;
        self.learned = kept;
        self.config.max_learned += self.config.max_learned_increment;

        self.rebuild_watchers();
        to_delete.len()
    }

    /// Rebuilds every watcher list from scratch. Needed after clause deletion
    /// shifts learned-clause indices.
    pub fn rebuild_watchers(&mut self) {
        self.watchers.clear();
        for (i, clause) in self.original.iter().enumerate() {
            let key = ClauseKey::Original(i as u32);
            let lits = clause.literals();
            let n = lits.len().min(2);
            for lit in &lits[..n] {
                self.watchers.entry(lit.negate().code()).or_default().push(key);
            }
        }
        for (i, clause) in self.learned.iter().enumerate() {
            let key = ClauseKey::Learned(i as u32);
            let lits = clause.literals();
            let n = lits.len().min(2);
            for lit in &lits[..n] {
                self.watchers.entry(lit.negate().code()).or_default().push(key);
            }
        }
    }
}

impl ClauseDBConfig {
    fn clause_db_decay(&self) -> f64 {
        self.clause_decay
    }
}
