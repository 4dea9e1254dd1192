//! The current (possibly partial) assignment to every atom.

use super::Atom;

/// A partial valuation: `None` until an atom is assigned, `Some(bool)` after.
///
/// Index `0` is unused (atoms are 1-indexed) and always reads `None`.
#[derive(Clone, Debug, Default)]
pub struct Valuation {
    values: Vec<Option<bool>>,
}

impl Valuation {
    /// Grows the valuation so `atom` is addressable.
    pub fn ensure_capacity(&mut self, atom: Atom) {
        let needed = atom as usize + 1;
        if self.values.len() < needed {
            self.values.resize(needed, None);
        }
    }

    /// The value of `atom`, if assigned.
    pub fn value_of(&self, atom: Atom) -> Option<bool> {
        self.values.get(atom as usize).copied().flatten()
    }

    /// Sets the value of `atom`.
    pub fn set(&mut self, atom: Atom, value: bool) {
        self.ensure_capacity(atom);
        self.values[atom as usize] = Some(value);
    }

    /// Clears the value of `atom`, returning it to unassigned.
    pub fn clear(&mut self, atom: Atom) {
        if let Some(slot) = self.values.get_mut(atom as usize) {
            *slot = None;
        }
    }

    /// The number of atoms (including the unused index 0) the valuation spans.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }

    /// Iterates over `(atom, value)` pairs for every assigned atom.
    pub fn assigned_pairs(&self) -> impl Iterator<Item = (Atom, bool)> + '_ {
        self.values
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(atom, v)| v.map(|value| (atom as Atom, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_atoms_read_none() {
        let v = Valuation::default();
        assert_eq!(v.value_of(5), None);
    }

    #[test]
    fn set_then_clear_round_trips() {
        let mut v = Valuation::default();
        v.set(3, true);
        assert_eq!(v.value_of(3), Some(true));
        v.clear(3);
        assert_eq!(v.value_of(3), None);
    }
}
