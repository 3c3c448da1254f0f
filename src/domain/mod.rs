//! Pure domain models: periods, daily spending, incomes, and budgets.
//! No I/O, no storage, no CLI.

pub mod budget;
pub mod common;
pub mod income;
pub mod period;
pub mod spending;

pub use budget::*;
pub use common::*;
pub use income::*;
pub use period::*;
pub use spending::*;
