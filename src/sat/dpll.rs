use std::convert::Infallible;

use indexmap::IndexSet;
use log::{debug, trace};
use thiserror::Error;

use crate::cnf::cnf::{
    Assignment, Formula, Variable, collect_variables, pick_branch_variable, simplify,
};
use crate::log::targets;

#[derive(Debug, Clone)]
pub enum SatResult<V> {
    Sat(Assignment<V>),
    Unsat,
}

// IndexMap equality needs `V: Hash + Eq`, which a derive would not ask for.
impl<V: Variable> PartialEq for SatResult<V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SatResult::Sat(a), SatResult::Sat(b)) => a == b,
            (SatResult::Unsat, SatResult::Unsat) => true,
            _ => false,
        }
    }
}

impl<V: Variable> Eq for SatResult<V> {}

impl<V> SatResult<V> {
    pub fn is_sat(&self) -> bool {
        matches!(self, SatResult::Sat(_))
    }

    pub fn model(&self) -> Option<&Assignment<V>> {
        match self {
            SatResult::Sat(m) => Some(m),
            SatResult::Unsat => None,
        }
    }

    pub fn into_model(self) -> Option<Assignment<V>> {
        match self {
            SatResult::Sat(m) => Some(m),
            SatResult::Unsat => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveOptions {
    /// Deepest branch nesting allowed before giving up. `None` means
    /// unbounded.
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub conflicts: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome<V> {
    pub result: SatResult<V>,
    pub stats: SearchStats,
}

impl<V: Variable> PartialEq for SolveOutcome<V> {
    fn eq(&self, other: &Self) -> bool {
        self.result == other.result && self.stats == other.stats
    }
}

impl<V: Variable> Eq for SolveOutcome<V> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("search depth exceeded the limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

/// Decides whether the search may descend below `depth` open branches.
trait DepthLimit {
    type Error;

    fn check(&self, depth: usize) -> Result<(), Self::Error>;
}

/// No limit; the search cannot fail.
struct Unbounded;

impl DepthLimit for Unbounded {
    type Error = Infallible;

    fn check(&self, _depth: usize) -> Result<(), Infallible> {
        Ok(())
    }
}

impl DepthLimit for SolveOptions {
    type Error = SolveError;

    fn check(&self, depth: usize) -> Result<(), SolveError> {
        match self.max_depth {
            Some(limit) if depth >= limit => {
                debug!(target: targets::SEARCH, "depth limit {} hit", limit);
                Err(SolveError::DepthLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }
}

pub fn solve<V: Variable>(formula: &Formula<V>) -> SatResult<V> {
    match search(formula, &Unbounded) {
        Ok(outcome) => outcome.result,
        Err(never) => match never {},
    }
}

pub fn is_sat<V: Variable>(formula: &Formula<V>) -> bool {
    solve(formula).is_sat()
}

pub fn solve_model<V: Variable>(formula: &Formula<V>) -> Option<Assignment<V>> {
    solve(formula).into_model()
}

/// A node that branched and is waiting on one of its children.
struct Frame<V> {
    /// Bindings made by this node's propagation pass.
    forced: Assignment<V>,
    /// Variables of the formula the node was entered with.
    scope: IndexSet<V>,
    /// The formula after propagation; both children derive from it.
    reduced: Formula<V>,
    var: V,
    value: bool,
}

impl<V: Variable> Frame<V> {
    fn child(&self) -> Formula<V> {
        simplify(&self.reduced, &self.var, self.value)
    }

    fn finish(self, child: Assignment<V>) -> Assignment<V> {
        let mut out = self.forced;
        out.insert(self.var, self.value);
        out.extend(child);
        fill_defaults(out, &self.scope)
    }
}

enum Node<V> {
    Sat(Assignment<V>),
    Unsat,
    Branch(Frame<V>),
}

/// Like [`solve`], but honours `options.max_depth` and reports search
/// statistics. Hitting the limit is an error, never an UNSAT answer.
pub fn solve_with<V: Variable>(
    formula: &Formula<V>,
    options: &SolveOptions,
) -> Result<SolveOutcome<V>, SolveError> {
    search(formula, options)
}

/// Runs the search on an explicit stack of branch frames instead of native
/// recursion, so depth is bounded by the heap and `limit` only.
fn search<V: Variable, L: DepthLimit>(
    formula: &Formula<V>,
    limit: &L,
) -> Result<SolveOutcome<V>, L::Error> {
    let mut stats = SearchStats::default();
    let mut stack = Vec::<Frame<V>>::new();
    let mut current = formula.clone();

    loop {
        let mut result = match expand(current, &mut stats) {
            Node::Branch(frame) => {
                limit.check(stack.len())?;
                stats.decisions += 1;
                trace!(
                    target: targets::BRANCH,
                    "depth {}: try value={}",
                    stack.len(),
                    frame.value
                );
                current = frame.child();
                stack.push(frame);
                stats.max_depth = stats.max_depth.max(stack.len());
                continue;
            }
            Node::Sat(model) => Some(model),
            Node::Unsat => {
                stats.conflicts += 1;
                None
            }
        };

        // unwind until a frame still has its false branch to try
        loop {
            let Some(mut frame) = stack.pop() else {
                debug!(
                    target: targets::SEARCH,
                    "done: sat={} nodes={} decisions={} conflicts={}",
                    result.is_some(),
                    stats.nodes,
                    stats.decisions,
                    stats.conflicts
                );
                let result = match result {
                    Some(model) => SatResult::Sat(model),
                    None => SatResult::Unsat,
                };
                return Ok(SolveOutcome { result, stats });
            };
            match result {
                Some(child) => {
                    result = Some(frame.finish(child));
                }
                None if frame.value => {
                    frame.value = false;
                    stats.decisions += 1;
                    trace!(
                        target: targets::BRANCH,
                        "depth {}: try value=false",
                        stack.len()
                    );
                    current = frame.child();
                    stack.push(frame);
                    break;
                }
                None => {}
            }
        }
    }
}

/// Handles the base cases and the propagation pass of one node.
fn expand<V: Variable>(formula: Formula<V>, stats: &mut SearchStats) -> Node<V> {
    stats.nodes += 1;
    if formula.is_empty() {
        return Node::Sat(Assignment::new());
    }
    if formula.is_contradiction() {
        return Node::Unsat;
    }

    let scope = collect_variables(&formula);
    let (forced, reduced) = propagate_units(&formula, stats);
    if reduced.is_contradiction() {
        return Node::Unsat;
    }

    match pick_branch_variable(&reduced) {
        Some(var) => Node::Branch(Frame {
            forced,
            scope,
            reduced,
            var,
            value: true,
        }),
        // nothing left to branch on, propagation satisfied every clause
        None => Node::Sat(fill_defaults(forced, &scope)),
    }
}

/// One pass over the unit clauses of `formula` as it was on entry. Units
/// exposed by the pass itself are left to the next node.
fn propagate_units<V: Variable>(
    formula: &Formula<V>,
    stats: &mut SearchStats,
) -> (Assignment<V>, Formula<V>) {
    let mut forced = Assignment::new();
    let mut reduced = formula.clone();
    for clause in formula.clauses() {
        let [lit] = clause.as_slice() else {
            continue;
        };
        reduced = simplify(&reduced, &lit.var, lit.sign);
        forced.insert(lit.var.clone(), lit.sign);
        stats.propagations += 1;
        if reduced.is_contradiction() {
            trace!(target: targets::PROPAGATION, "unit conflict");
            break;
        }
    }
    (forced, reduced)
}

/// Binds every variable of `scope` that is still free to `true`.
fn fill_defaults<V: Variable>(mut model: Assignment<V>, scope: &IndexSet<V>) -> Assignment<V> {
    for var in scope {
        if !model.contains_key(var) {
            model.insert(var.clone(), true);
        }
    }
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::cnf::Lit;

    fn chain(n: u32) -> Formula<u32> {
        // x1 and (x_i -> x_{i+1}) for all i, then not x_n: unsat after n steps
        let mut clauses = vec![vec![Lit::new(1, true)]];
        for i in 1..n {
            clauses.push(vec![Lit::new(i, false), Lit::new(i + 1, true)]);
        }
        clauses.push(vec![Lit::new(n, false)]);
        Formula::new(clauses)
    }

    #[test]
    fn propagation_pass_does_not_reach_closure() {
        // x1 forces x2 only after the first pass
        let f = Formula::new(vec![
            vec![Lit::new(1u32, true)],
            vec![Lit::new(1, false), Lit::new(2, true)],
        ]);
        let mut stats = SearchStats::default();
        let (forced, reduced) = propagate_units(&f, &mut stats);
        assert_eq!(forced.len(), 1);
        assert_eq!(reduced, Formula::new(vec![vec![Lit::new(2, true)]]));
        assert_eq!(stats.propagations, 1);
    }

    #[test]
    fn long_chain_needs_no_native_recursion() {
        let outcome = solve_with(&chain(5000), &SolveOptions::default()).expect("no limit");
        assert_eq!(outcome.result, SatResult::Unsat);
        assert!(outcome.stats.max_depth > 1000);
    }

    #[test]
    fn depth_limit_is_an_error() {
        let clauses = (1..=40u32)
            .map(|v| vec![Lit::new(v, true), Lit::new(v + 1, false)])
            .collect::<Vec<_>>();
        let f = Formula::new(clauses);
        let err = solve_with(&f, &SolveOptions { max_depth: Some(3) }).expect_err("too deep");
        assert_eq!(err, SolveError::DepthLimitExceeded { limit: 3 });

        let ok = solve_with(&f, &SolveOptions { max_depth: Some(100) }).expect("fits");
        assert!(ok.result.is_sat());
        assert!(ok.stats.max_depth <= 100);
    }

    #[test]
    fn stats_count_backtracking() {
        // a must be false; the true branch fails first
        let f = Formula::new(vec![
            vec![Lit::new("a", false), Lit::new("b", true)],
            vec![Lit::new("a", false), Lit::new("b", false)],
        ]);
        let outcome = solve_with(&f, &SolveOptions::default()).expect("no limit");
        let model = outcome.result.into_model().expect("sat");
        assert_eq!(model.get("a"), Some(&false));
        assert_eq!(outcome.stats.decisions, 2);
        assert!(outcome.stats.conflicts >= 1);
    }

    #[test]
    fn results_compare_by_model_contents() {
        let mut a = Assignment::new();
        a.insert("x".to_owned(), true);
        a.insert("y".to_owned(), false);
        let mut b = Assignment::new();
        b.insert("y".to_owned(), false);
        b.insert("x".to_owned(), true);
        assert_eq!(SatResult::Sat(a.clone()), SatResult::Sat(b));
        assert_ne!(SatResult::Sat(a), SatResult::Unsat);
        assert_eq!(SatResult::<String>::Unsat, SatResult::Unsat);
    }

    #[test]
    fn unbounded_solve_matches_solve_with() {
        let f = chain(300);
        let outcome = solve_with(&f, &SolveOptions::default()).expect("no limit");
        assert_eq!(solve(&f), outcome.result);
        let again = solve_with(&f, &SolveOptions::default()).expect("no limit");
        assert_eq!(outcome, again);
    }
}
