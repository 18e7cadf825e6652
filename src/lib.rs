pub mod cnf;
pub mod generate;
pub mod grid;
pub mod log;
pub mod sat;
pub mod solver;
