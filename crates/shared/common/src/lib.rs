//! Common utilities shared across the ledger crates.
//!
//! This crate provides:
//! - The closed application error set
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
