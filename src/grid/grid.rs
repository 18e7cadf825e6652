use std::fmt;
use std::io::BufRead;

use anyhow::{Context, Result, bail};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid side {0} is not a perfect square")]
    NotSquare(usize),
    #[error("row {row} has {len} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("cell ({row}, {col}) holds {value}, allowed range is 0..={max}")]
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: usize,
        max: usize,
    },
    #[error("cell ({row}, {col}) is outside a {n}x{n} grid")]
    CellOutOfRange { row: usize, col: usize, n: usize },
    #[error("grid side {0} is too large to number its variables")]
    TooLarge(usize),
    #[error("grid is empty")]
    Empty,
}

/// Square latin grid with box constraints; `0` marks an open cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    n: usize,
    cells: Vec<usize>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<usize>>) -> Result<Self, GridError> {
        let n = rows.len();
        if n == 0 {
            return Err(GridError::Empty);
        }
        let box_side = box_side(n).ok_or(GridError::NotSquare(n))?;
        debug_assert_eq!(box_side * box_side, n);

        let mut cells = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(GridError::RaggedRow {
                    row,
                    len: values.len(),
                    expected: n,
                });
            }
            for (col, value) in values.into_iter().enumerate() {
                if value > n {
                    return Err(GridError::ValueOutOfRange {
                        row,
                        col,
                        value,
                        max: n,
                    });
                }
                cells.push(value);
            }
        }
        Ok(Self { n, cells })
    }

    /// A grid of side `n` with every cell open.
    pub fn open(n: usize) -> Result<Self, GridError> {
        if n == 0 {
            return Err(GridError::Empty);
        }
        box_side(n).ok_or(GridError::NotSquare(n))?;
        Ok(Self {
            n,
            cells: vec![0; n * n],
        })
    }

    pub fn parse_str(s: &str) -> Result<Self> {
        Self::parse_reader(std::io::Cursor::new(s.as_bytes()))
    }

    /// One row per line, cells separated by whitespace; `.` or `0` is open
    /// and `#` starts a comment.
    pub fn parse_reader<R: BufRead>(r: R) -> Result<Self> {
        let mut rows = Vec::<Vec<usize>>::new();
        for (idx, line) in r.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.context("failed to read grid line")?;
            let clean = line.split('#').next().unwrap_or_default().trim();
            if clean.is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for tok in clean.split_whitespace() {
                if tok == "." {
                    row.push(0);
                    continue;
                }
                let value = tok
                    .parse::<usize>()
                    .with_context(|| format!("line {}: invalid cell '{}'", line_no, tok))?;
                row.push(value);
            }
            rows.push(row);
        }
        if rows.is_empty() {
            bail!("no grid rows found");
        }
        Ok(Self::from_rows(rows)?)
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn box_side(&self) -> usize {
        // checked on construction
        box_side(self.n).unwrap_or(1)
    }

    pub fn get(&self, row: usize, col: usize) -> usize {
        self.cells[row * self.n + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: usize) -> Result<(), GridError> {
        let n = self.n;
        if row >= n || col >= n {
            return Err(GridError::CellOutOfRange { row, col, n });
        }
        if value > n {
            return Err(GridError::ValueOutOfRange {
                row,
                col,
                value,
                max: n,
            });
        }
        self.cells[row * n + col] = value;
        Ok(())
    }

    pub fn rows(&self) -> Vec<Vec<usize>> {
        self.cells.chunks(self.n).map(<[usize]>::to_vec).collect()
    }

    pub fn num_open(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    pub fn is_complete(&self) -> bool {
        self.num_open() == 0
    }

    /// Complete, with every row, column and box a permutation of `1..=n`.
    pub fn is_valid_solution(&self) -> bool {
        if !self.is_complete() {
            return false;
        }
        let units = self.units();
        units.iter().all(|unit| {
            let mut seen = vec![false; self.n + 1];
            unit.iter().all(|&(r, c)| {
                let v = self.get(r, c);
                !std::mem::replace(&mut seen[v], true)
            })
        })
    }

    /// Whether `other` keeps every fixed cell of `self`.
    pub fn is_extended_by(&self, other: &Grid) -> bool {
        self.n == other.n
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(&a, &b)| a == 0 || a == b)
    }

    /// Every row, then every column, then every box, as lists of positions.
    pub fn units(&self) -> Vec<Vec<(usize, usize)>> {
        let n = self.n;
        let side = self.box_side();
        let mut out = Vec::with_capacity(3 * n);
        for r in 0..n {
            out.push((0..n).map(|c| (r, c)).collect());
        }
        for c in 0..n {
            out.push((0..n).map(|r| (r, c)).collect());
        }
        for br in (0..n).step_by(side) {
            for bc in (0..n).step_by(side) {
                let mut cells = Vec::with_capacity(n);
                for r in br..br + side {
                    for c in bc..bc + side {
                        cells.push((r, c));
                    }
                }
                out.push(cells);
            }
        }
        out
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.n.to_string().len();
        for row in self.cells.chunks(self.n) {
            let line = row
                .iter()
                .map(|&v| {
                    if v == 0 {
                        format!("{:>width$}", ".")
                    } else {
                        format!("{:>width$}", v)
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn box_side(n: usize) -> Option<usize> {
    (1..=n).take_while(|s| s * s <= n).find(|s| s * s == n)
}
