pub mod dpll_backend;
pub mod varisat;

use anyhow::Result;

use crate::cnf::cnf::{Formula, Variable};
use crate::sat::dpll::SatResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Dpll,
    Varisat,
}

impl BackendKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "dpll" => Ok(BackendKind::Dpll),
            "varisat" => Ok(BackendKind::Varisat),
            _ => anyhow::bail!("unknown backend '{}', expected dpll|varisat", name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solve_calls: usize,
    pub decisions: usize,
    pub conflicts: usize,
}

pub trait FormulaSolver {
    fn solve<V: Variable>(&mut self, formula: &Formula<V>) -> Result<SatResult<V>>;
    fn stats(&self) -> SolverStats;
    fn backend_name(&self) -> &'static str;
}
