// File: ./src/lib.rs
// Crate root library declaration and module exports.
pub mod alarms;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod lists;
pub mod migrate;
pub mod model;
pub mod reminders;
pub mod store;
pub mod transform;
