//! Agro Ledger
//!
//! Append-only block log for the agricultural distribution system.
//!
//! # Architecture
//!
//! - **Append-only**: Blocks are never modified or deleted once pushed
//! - **Linked**: Every block carries the token of its predecessor
//! - **Flat files**: One `|`-delimited line per record, shared with the entity store
//!
//! # Invariants
//!
//! - The chain always holds a genesis block (number 0)
//! - Block numbers are strictly increasing with no gaps
//! - `block[i].previous_token == block[i - 1].token` for every `i > 0`

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod token;
pub mod ledger;
pub mod storage;
pub mod error;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::{Block, BlockToken, Timestamp, TIMESTAMP_FORMAT};
pub use token::TokenGenerator;
pub use ledger::Ledger;
pub use storage::{load_records, save_records, split_fields, LoadReport, Record};
pub use config::Config;
