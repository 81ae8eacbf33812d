pub mod cell;
pub mod chart;
pub mod render;
pub mod table;

pub use cell::CellValue;
pub use table::{Column, Dataset, Table};
