#[allow(clippy::module_inception)]
pub mod cnf;
pub mod dimacs;

pub use cnf::{
    Assignment, Clause, Formula, Lit, Variable, collect_variables, pick_branch_variable, simplify,
};
