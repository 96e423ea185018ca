// Core database operations
pub mod core;
mod dataset_operations;
mod lock_operations;
mod property_operations;
mod transaction;

pub use core::DbOperations;
pub use transaction::SledTransaction;
