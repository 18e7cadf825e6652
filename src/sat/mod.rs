pub mod dpll;

pub use dpll::{
    SatResult, SearchStats, SolveError, SolveOptions, SolveOutcome, is_sat, solve, solve_model,
    solve_with,
};
