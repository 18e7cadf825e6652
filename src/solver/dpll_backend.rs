use anyhow::Result;

use crate::cnf::cnf::{Formula, Variable};
use crate::sat::dpll::{SatResult, SolveOptions, solve_with};
use crate::solver::{FormulaSolver, SolverStats};

#[derive(Debug, Clone, Default)]
pub struct DpllBackend {
    options: SolveOptions,
    stats: SolverStats,
}

impl DpllBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SolveOptions) -> Self {
        Self {
            options,
            stats: SolverStats::default(),
        }
    }
}

impl FormulaSolver for DpllBackend {
    fn solve<V: Variable>(&mut self, formula: &Formula<V>) -> Result<SatResult<V>> {
        self.stats.solve_calls += 1;
        let outcome = solve_with(formula, &self.options)?;
        self.stats.decisions += outcome.stats.decisions;
        self.stats.conflicts += outcome.stats.conflicts;
        Ok(outcome.result)
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        "dpll"
    }
}
