use std::fmt;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Anything usable as a variable identifier.
pub trait Variable: Clone + Eq + Hash {}

impl<T: Clone + Eq + Hash> Variable for T {}

/// Variable bindings in the order they were made.
pub type Assignment<V> = IndexMap<V, bool>;

pub type Clause<V> = Vec<Lit<V>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit<V> {
    pub var: V,
    pub sign: bool,
}

impl<V> Lit<V> {
    pub fn new(var: V, sign: bool) -> Self {
        Self { var, sign }
    }

    pub fn pos(var: V) -> Self {
        Self::new(var, true)
    }

    pub fn neg_of(var: V) -> Self {
        Self::new(var, false)
    }

    pub fn neg(self) -> Self {
        Self {
            var: self.var,
            sign: !self.sign,
        }
    }

    /// Whether binding `value` to this literal's variable satisfies it.
    pub fn accepts(&self, value: bool) -> bool {
        self.sign == value
    }
}

impl<V: fmt::Display> fmt::Display for Lit<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign {
            write!(f, "{}", self.var)
        } else {
            write!(f, "¬{}", self.var)
        }
    }
}

/// A CNF formula. Never mutated once built; [`simplify`] returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula<V> {
    clauses: Vec<Clause<V>>,
}

impl<V> Formula<V> {
    pub fn new(clauses: Vec<Clause<V>>) -> Self {
        Self { clauses }
    }

    /// The formula with no clauses, i.e. constant true.
    pub fn empty() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// The canonical unsatisfiable marker: exactly one empty clause.
    pub fn contradiction() -> Self {
        Self {
            clauses: vec![Vec::new()],
        }
    }

    pub fn clauses(&self) -> &[Clause<V>] {
        &self.clauses
    }

    pub fn into_clauses(self) -> Vec<Clause<V>> {
        self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True when some clause is empty. [`simplify`] only ever produces this
    /// state in its canonical single-clause form.
    pub fn is_contradiction(&self) -> bool {
        self.clauses.iter().any(|c| c.is_empty())
    }

    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Vec::len).sum()
    }

    pub fn max_clause_width(&self) -> usize {
        self.clauses.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn map_vars<W, F>(&self, mut f: F) -> Formula<W>
    where
        F: FnMut(&V) -> W,
    {
        Formula {
            clauses: self
                .clauses
                .iter()
                .map(|clause| clause.iter().map(|l| Lit::new(f(&l.var), l.sign)).collect())
                .collect(),
        }
    }

    /// Like [`Formula::map_vars`], stopping at the first error.
    pub fn try_map_vars<W, E, F>(&self, mut f: F) -> Result<Formula<W>, E>
    where
        F: FnMut(&V) -> Result<W, E>,
    {
        let mut clauses = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            let mut out = Vec::with_capacity(clause.len());
            for l in clause {
                out.push(Lit::new(f(&l.var)?, l.sign));
            }
            clauses.push(out);
        }
        Ok(Formula { clauses })
    }
}

impl<V: Variable> Formula<V> {
    /// `Some(true)` if every clause is satisfied, `Some(false)` if some clause
    /// has all of its literals bound and false, `None` otherwise.
    pub fn evaluate(&self, assignment: &Assignment<V>) -> Option<bool> {
        let mut all_true = true;
        for clause in &self.clauses {
            match eval_clause(clause, assignment) {
                Some(true) => {}
                Some(false) => return Some(false),
                None => all_true = false,
            }
        }
        if all_true { Some(true) } else { None }
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment<V>) -> bool {
        self.evaluate(assignment) == Some(true)
    }
}

fn eval_clause<V: Variable>(clause: &[Lit<V>], assignment: &Assignment<V>) -> Option<bool> {
    let mut any_unknown = false;
    for lit in clause {
        match assignment.get(&lit.var) {
            Some(&v) if lit.accepts(v) => return Some(true),
            Some(_) => {}
            None => any_unknown = true,
        }
    }
    if any_unknown { None } else { Some(false) }
}

impl<V> Default for Formula<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> From<Vec<Clause<V>>> for Formula<V> {
    fn from(clauses: Vec<Clause<V>>) -> Self {
        Self::new(clauses)
    }
}

impl<V> FromIterator<Clause<V>> for Formula<V> {
    fn from_iter<I: IntoIterator<Item = Clause<V>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<V: fmt::Display> fmt::Display for Formula<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return write!(f, "⊤");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " ∧ ")?;
            }
            if clause.is_empty() {
                write!(f, "⊥")?;
                continue;
            }
            write!(f, "(")?;
            for (j, lit) in clause.iter().enumerate() {
                if j > 0 {
                    write!(f, " ∨ ")?;
                }
                write!(f, "{lit}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Applies the binding `var = value` to every clause.
///
/// Clauses not mentioning `var` pass through. A clause holding a literal
/// that `value` satisfies is dropped, even if it also holds the opposite
/// literal. Otherwise the falsified literals are removed, keeping the order
/// of what is left. Should any clause end up empty the whole result is
/// [`Formula::contradiction`].
pub fn simplify<V: Variable>(formula: &Formula<V>, var: &V, value: bool) -> Formula<V> {
    let mut out = Vec::with_capacity(formula.clauses.len());
    for clause in &formula.clauses {
        let mut mentions = false;
        let mut satisfied = false;
        for lit in clause {
            if &lit.var == var {
                mentions = true;
                if lit.accepts(value) {
                    satisfied = true;
                    break;
                }
            }
        }

        if !mentions {
            out.push(clause.clone());
            continue;
        }
        if satisfied {
            continue;
        }

        let rest = clause
            .iter()
            .filter(|l| &l.var != var)
            .cloned()
            .collect::<Vec<_>>();
        if rest.is_empty() {
            return Formula::contradiction();
        }
        out.push(rest);
    }
    Formula::new(out)
}

/// Every distinct variable, in order of first occurrence.
pub fn collect_variables<V: Variable>(formula: &Formula<V>) -> IndexSet<V> {
    formula
        .clauses
        .iter()
        .flatten()
        .map(|l| l.var.clone())
        .collect()
}

/// Variable of the first literal of the first non-empty clause.
pub fn pick_branch_variable<V: Variable>(formula: &Formula<V>) -> Option<V> {
    formula
        .clauses
        .iter()
        .find_map(|c| c.first())
        .map(|l| l.var.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: &str, s: bool) -> Lit<String> {
        Lit::new(v.to_owned(), s)
    }

    fn formula(clauses: &[&[(&str, bool)]]) -> Formula<String> {
        clauses
            .iter()
            .map(|c| c.iter().map(|&(v, s)| lit(v, s)).collect())
            .collect()
    }

    #[test]
    fn untouched_clauses_pass_through() {
        let f = formula(&[&[("b", true), ("c", false)], &[("a", true)]]);
        let out = simplify(&f, &"a".to_owned(), true);
        assert_eq!(out, formula(&[&[("b", true), ("c", false)]]));
    }

    #[test]
    fn falsified_literal_is_removed_in_place() {
        let f = formula(&[&[("b", true), ("a", false), ("c", true)], &[("d", true)]]);
        let out = simplify(&f, &"a".to_owned(), true);
        assert_eq!(out, formula(&[&[("b", true), ("c", true)], &[("d", true)]]));
    }

    #[test]
    fn emptied_clause_collapses_everything() {
        let f = formula(&[&[("b", true)], &[("a", false)], &[("c", true)]]);
        let out = simplify(&f, &"a".to_owned(), true);
        assert_eq!(out, Formula::contradiction());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn tautology_dropped_for_either_value() {
        let both_ways = formula(&[&[("a", false), ("a", true)], &[("b", true)]]);
        for value in [false, true] {
            let out = simplify(&both_ways, &"a".to_owned(), value);
            assert_eq!(out, formula(&[&[("b", true)]]));
        }
    }

    #[test]
    fn pick_skips_empty_clauses() {
        let f: Formula<String> = Formula::new(vec![vec![], vec![lit("x", false), lit("y", true)]]);
        assert_eq!(pick_branch_variable(&f), Some("x".to_owned()));
        assert_eq!(pick_branch_variable(&Formula::<String>::empty()), None);
        assert_eq!(pick_branch_variable(&Formula::<String>::contradiction()), None);
    }

    #[test]
    fn collect_keeps_first_occurrence_order() {
        let f = formula(&[&[("b", true), ("a", false)], &[("a", true), ("c", true)]]);
        let vars = collect_variables(&f).into_iter().collect::<Vec<_>>();
        assert_eq!(vars, vec!["b", "a", "c"]);
    }

    #[test]
    fn evaluate_partial() {
        let f = formula(&[&[("a", true), ("b", false)], &[("c", true)]]);
        let mut asg = Assignment::new();
        asg.insert("a".to_owned(), true);
        assert_eq!(f.evaluate(&asg), None);
        asg.insert("c".to_owned(), false);
        assert_eq!(f.evaluate(&asg), Some(false));
        asg.insert("c".to_owned(), true);
        assert_eq!(f.evaluate(&asg), Some(true));
    }

    #[test]
    fn display_uses_connectives() {
        let f = formula(&[&[("a", true), ("b", false)], &[("c", true)]]);
        assert_eq!(f.to_string(), "(a ∨ ¬b) ∧ (c)");
        assert_eq!(Formula::<String>::contradiction().to_string(), "⊥");
        assert_eq!(Formula::<String>::empty().to_string(), "⊤");
    }
}
