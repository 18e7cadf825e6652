use anyhow::Result;

use crate::sat::dpll::{SatResult, SolveOptions, solve_with};

use super::encode::{CellVar, encode_grid};
use super::grid::{Grid, GridError};

/// Rebuilds an `n × n` grid from every variable bound `true`.
///
/// `Ok(None)` is the "no solution" answer for an unsatisfiable result.
/// Variables that point outside the grid are ignored; later bindings win
/// when two values claim the same cell.
pub fn decode_grid(result: &SatResult<CellVar>, n: usize) -> Result<Option<Grid>, GridError> {
    let Some(model) = result.model() else {
        return Ok(None);
    };
    let mut grid = Grid::open(n)?;
    for (var, &value) in model {
        if !value || var.row >= n || var.col >= n || var.value == 0 || var.value > n {
            continue;
        }
        grid.set(var.row, var.col, var.value)?;
    }
    Ok(Some(grid))
}

/// Encodes, solves and decodes in one go.
pub fn solve_grid(grid: &Grid, options: &SolveOptions) -> Result<Option<Grid>> {
    let formula = encode_grid(grid);
    let outcome = solve_with(&formula, options)?;
    Ok(decode_grid(&outcome.result, grid.size())?)
}
