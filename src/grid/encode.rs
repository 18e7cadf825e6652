use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use crate::cnf::cnf::{Clause, Formula, Lit};
use crate::log::targets;

use super::grid::{Grid, GridError};

/// "Cell (`row`, `col`) holds `value`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellVar {
    pub value: usize,
    pub row: usize,
    pub col: usize,
}

impl CellVar {
    pub fn new(value: usize, row: usize, col: usize) -> Self {
        Self { value, row, col }
    }

    /// 1-based DIMACS number in a grid of side `n`, value-major:
    /// `(value - 1) * n * n + row * n + col + 1`.
    pub fn dimacs_index(&self, n: usize) -> Result<u32, GridError> {
        if self.value == 0 || self.value > n {
            return Err(GridError::ValueOutOfRange {
                row: self.row,
                col: self.col,
                value: self.value,
                max: n,
            });
        }
        if self.row >= n || self.col >= n {
            return Err(GridError::CellOutOfRange {
                row: self.row,
                col: self.col,
                n,
            });
        }
        let index = n
            .checked_mul(n)
            .and_then(|nn| nn.checked_mul(self.value - 1))
            .and_then(|base| base.checked_add(self.row * n + self.col + 1))
            .ok_or(GridError::TooLarge(n))?;
        u32::try_from(index).map_err(|_| GridError::TooLarge(n))
    }
}

/// Renumbers an encoded grid onto DIMACS variables, see
/// [`CellVar::dimacs_index`].
pub fn number_cells(formula: &Formula<CellVar>, n: usize) -> Result<Formula<u32>, GridError> {
    formula.try_map_vars(|v| v.dimacs_index(n))
}

impl fmt::Display for CellVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.value, self.row, self.col)
    }
}

impl FromStr for CellVar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split('.').collect::<Vec<_>>();
        let [value, row, col] = parts.as_slice() else {
            bail!("expected value.row.col, got '{}'", s);
        };
        Ok(Self {
            value: value.parse().with_context(|| format!("bad value in '{}'", s))?,
            row: row.parse().with_context(|| format!("bad row in '{}'", s))?,
            col: col.parse().with_context(|| format!("bad col in '{}'", s))?,
        })
    }
}

/// Encodes the puzzle as CNF over [`CellVar`]s.
///
/// Fixed cells become unit clauses. Each open cell gets an at-least-one
/// clause over all values plus pairwise at-most-one clauses. Every row,
/// column and box must hold each value somewhere, and no value twice.
pub fn encode_grid(grid: &Grid) -> Formula<CellVar> {
    let n = grid.size();
    let mut clauses = Vec::<Clause<CellVar>>::new();

    for row in 0..n {
        for col in 0..n {
            match grid.get(row, col) {
                0 => {
                    let some = (1..=n)
                        .map(|v| Lit::pos(CellVar::new(v, row, col)))
                        .collect::<Vec<_>>();
                    for v in 1..=n {
                        for v2 in v + 1..=n {
                            clauses.push(vec![
                                Lit::neg_of(CellVar::new(v, row, col)),
                                Lit::neg_of(CellVar::new(v2, row, col)),
                            ]);
                        }
                    }
                    clauses.push(some);
                }
                fixed => clauses.push(vec![Lit::pos(CellVar::new(fixed, row, col))]),
            }
        }
    }

    for unit in grid.units() {
        push_unit_constraints(&mut clauses, &unit, n);
    }

    log::debug!(
        target: targets::GRID,
        "encoded {}x{} grid ({} open): {} clauses",
        n,
        n,
        grid.num_open(),
        clauses.len()
    );
    Formula::new(clauses)
}

fn push_unit_constraints(clauses: &mut Vec<Clause<CellVar>>, cells: &[(usize, usize)], n: usize) {
    for value in 1..=n {
        let mut some = Vec::with_capacity(cells.len());
        for (i, &(r, c)) in cells.iter().enumerate() {
            some.push(Lit::pos(CellVar::new(value, r, c)));
            for &(r2, c2) in &cells[i + 1..] {
                clauses.push(vec![
                    Lit::neg_of(CellVar::new(value, r, c)),
                    Lit::neg_of(CellVar::new(value, r2, c2)),
                ]);
            }
        }
        clauses.push(some);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::cnf::collect_variables;

    #[test]
    fn cell_var_text_form() {
        let v = CellVar::new(3, 0, 2);
        assert_eq!(v.to_string(), "3.0.2");
        assert_eq!("3.0.2".parse::<CellVar>().expect("parse"), v);
        assert!("3.0".parse::<CellVar>().is_err());
        assert!("x.0.1".parse::<CellVar>().is_err());
    }

    #[test]
    fn fixed_cells_become_units() {
        let mut grid = Grid::open(4).expect("grid");
        grid.set(1, 2, 4).expect("in range");
        let f = encode_grid(&grid);
        let units = f
            .clauses()
            .iter()
            .filter(|c| c.len() == 1)
            .collect::<Vec<_>>();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0][0], Lit::pos(CellVar::new(4, 1, 2)));
    }

    #[test]
    fn open_grid_mentions_every_cell_value() {
        let grid = Grid::open(4).expect("grid");
        let f = encode_grid(&grid);
        assert_eq!(collect_variables(&f).len(), 4 * 4 * 4);
        // per cell: 6 pairs + 1; per unit and value: 6 pairs + 1
        assert_eq!(f.len(), 16 * 7 + 12 * 4 * 7);
    }

    #[test]
    fn dimacs_numbering_is_value_major() {
        assert_eq!(CellVar::new(1, 0, 0).dimacs_index(4), Ok(1));
        assert_eq!(CellVar::new(1, 3, 3).dimacs_index(4), Ok(16));
        assert_eq!(CellVar::new(4, 3, 3).dimacs_index(4), Ok(64));
        assert!(CellVar::new(5, 0, 0).dimacs_index(4).is_err());
        assert!(CellVar::new(1, 4, 0).dimacs_index(4).is_err());
    }

    #[test]
    fn numbering_overflow_is_reported() {
        let n = 1usize << 12;
        let var = CellVar::new(n, n - 1, n - 1);
        assert_eq!(var.dimacs_index(n), Err(GridError::TooLarge(n)));
    }

    #[test]
    fn numbered_encoding_keeps_shape() {
        let grid = Grid::open(4).expect("grid");
        let f = encode_grid(&grid);
        let numbered = number_cells(&f, 4).expect("fits in u32");
        assert_eq!(numbered.len(), f.len());
        assert_eq!(collect_variables(&numbered).len(), 64);
        assert!(numbered.clauses().iter().flatten().all(|l| (1..=64).contains(&l.var)));
    }
}
