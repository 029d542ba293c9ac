//! Command-line front-end for the ledger

pub mod commands;

pub use commands::*;
