use anyhow::{Result, bail};
use indexmap::{IndexMap, IndexSet};
use varisat::ExtendFormula;

use crate::cnf::cnf::{Assignment, Formula, Variable};
use crate::log::targets;
use crate::sat::dpll::SatResult;
use crate::solver::{FormulaSolver, SolverStats};

/// Solves through `varisat`, mapping arbitrary variables onto its indices.
/// A fresh varisat instance is built per call.
#[derive(Debug, Clone, Default)]
pub struct VarisatBackend {
    stats: SolverStats,
}

impl VarisatBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormulaSolver for VarisatBackend {
    fn solve<V: Variable>(&mut self, formula: &Formula<V>) -> Result<SatResult<V>> {
        self.stats.solve_calls += 1;
        let mut inner = varisat::Solver::new();
        let mut vars = IndexMap::<V, varisat::Var>::new();

        for clause in formula.clauses() {
            let mut lits = Vec::with_capacity(clause.len());
            for lit in clause {
                let var = match vars.get(&lit.var) {
                    Some(&v) => v,
                    None => {
                        let v = inner.new_var();
                        vars.insert(lit.var.clone(), v);
                        v
                    }
                };
                lits.push(varisat::Lit::from_var(var, lit.sign));
            }
            inner.add_clause(&lits);
        }
        log::debug!(
            target: targets::BACKEND,
            "varisat: {} vars, {} clauses",
            vars.len(),
            formula.len()
        );

        match inner.solve() {
            Ok(true) => {}
            Ok(false) => {
                self.stats.conflicts += 1;
                return Ok(SatResult::Unsat);
            }
            Err(e) => bail!("varisat failed: {:?}", e),
        }

        let model = inner
            .model()
            .ok_or_else(|| anyhow::anyhow!("varisat reported sat without a model"))?;
        let negative = model
            .into_iter()
            .filter(|l| l.is_negative())
            .map(|l| l.var())
            .collect::<IndexSet<_>>();

        // variables the model leaves open follow the default-true convention
        let assignment = vars
            .into_iter()
            .map(|(name, v)| (name, !negative.contains(&v)))
            .collect::<Assignment<V>>();
        Ok(SatResult::Sat(assignment))
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        "varisat"
    }
}
