#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
/// Scientific calculator with an evaluation history
pub mod calculator;
/// Runtime settings: data directory, file names and time zone
pub mod config;
/// Error handling and custom [`Error`](std::error::Error) types
pub mod errors;
/// Functions and stores for reading and writing accounts, stock and the borrow ledger
pub mod io;
/// Business logic for registering, borrowing and editing stock
mod ops;
#[cfg(test)]
mod proptests;
/// Login state machine tying the stores together
pub mod session;
/// Data types used throughout the borrowing core
pub mod types;
