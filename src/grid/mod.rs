pub mod decode;
pub mod encode;
#[allow(clippy::module_inception)]
pub mod grid;

pub use decode::{decode_grid, solve_grid};
pub use encode::{CellVar, encode_grid, number_cells};
pub use grid::{Grid, GridError};
