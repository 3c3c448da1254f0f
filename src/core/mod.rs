pub mod carryover;
pub mod errors;
pub mod ownership;
pub mod services;
