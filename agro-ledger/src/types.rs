//! Core types for the ledger
//!
//! Blocks are plain values: once a block has been pushed onto the chain it is
//! never handed out mutably.

use crate::{
    storage::{parse_field, Record},
    Error, Result,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of every persisted timestamp (local time, minute resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d:%H:%M";

/// Opaque content token attached to a block
///
/// Tokens are unique labels, not digests of the block payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockToken(String);

impl BlockToken {
    /// Create new token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local timestamp in `YYYYMMDD:HH:MM` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current local time
    pub fn now() -> Self {
        Self(Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse a persisted timestamp, rejecting anything not in `YYYYMMDD:HH:MM` form
    pub fn parse(value: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .ok()
            .map(|_| Self(value.to_string()))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable entry of the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Sequence number (0 = genesis)
    pub number: u64,

    /// Token of this block
    pub token: BlockToken,

    /// Token of the predecessor (self-generated for genesis)
    pub previous_token: BlockToken,

    /// Creation time
    pub timestamp: Timestamp,

    /// Event description
    pub payload: String,
}

impl Block {
    /// Whether this is the first block of a chain
    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block {} | {} | {} | {} | {}",
            self.number, self.token, self.previous_token, self.timestamp, self.payload
        )
    }
}

impl Record for Block {
    const KIND: &'static str = "block";
    const MIN_FIELDS: usize = 5;
    // The payload is free text and may itself contain the delimiter.
    const MAX_FIELDS: Option<usize> = Some(5);

    /// Line breaks in the payload are written as spaces, so a payload that
    /// contains them does not survive persist and restore unchanged.
    fn to_line(&self) -> String {
        let payload = self.payload.replace(&['\r', '\n'][..], " ");
        format!(
            "{}|{}|{}|{}|{}",
            self.number, self.token, self.previous_token, self.timestamp, payload
        )
    }

    fn from_fields(fields: &[&str]) -> Result<Self> {
        let number = parse_field(Self::KIND, "number", fields[0])?;

        if fields[1].is_empty() {
            return Err(Error::malformed(Self::KIND, "empty block token"));
        }

        let timestamp = Timestamp::parse(fields[3]).ok_or_else(|| {
            Error::malformed(Self::KIND, format!("invalid timestamp '{}'", fields[3]))
        })?;

        Ok(Block {
            number,
            token: BlockToken::new(fields[1]),
            previous_token: BlockToken::new(fields[2]),
            timestamp,
            payload: fields[4].to_string(),
        })
    }
}
