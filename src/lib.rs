#![doc(test(attr(deny(warnings))))]

//! Spend Tracker records daily household spending inside owner-scoped
//! periods and keeps a rolling carryover balance from one day to the next,
//! alongside period incomes, budget allocations, and savings.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod storage;
pub mod utils;

pub use crate::core::carryover::{CarryoverEngine, ProjectedDay};
pub use crate::core::errors::{ErrorKind, Result, TrackerError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Spend Tracker tracing initialized.");
    });
}
