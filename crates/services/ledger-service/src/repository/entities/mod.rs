//! SeaORM entities for the ledger tables.

pub mod account;
pub mod user;
