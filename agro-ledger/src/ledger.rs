//! Main ledger orchestration layer
//!
//! The ledger owns the block sequence and is only ever mutated through
//! [`Ledger::append`] (or replaced wholesale by [`Ledger::reset`]).
//!
//! # Example
//!
//! ```
//! use agro_ledger::{Config, Ledger};
//!
//! let mut ledger = Ledger::new(&Config::default());
//! ledger.append("Added Product | Rice").unwrap();
//!
//! assert_eq!(ledger.len(), 2);
//! assert!(ledger.verify());
//! ```

use crate::{
    storage::{load_records, save_records},
    token::TokenGenerator,
    types::{Block, Timestamp},
    Config, Error, Result,
};
use std::path::Path;

/// Append-only chain of blocks
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Blocks in append order, never empty
    chain: Vec<Block>,

    /// Token source for new blocks
    tokens: TokenGenerator,

    /// Payload of regenerated genesis blocks
    genesis_payload: String,
}

impl Ledger {
    /// Create a ledger holding only a genesis block
    pub fn new(config: &Config) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            tokens: TokenGenerator::new(config.token_length),
            genesis_payload: config.genesis_payload.clone(),
        };
        ledger.push_genesis();
        ledger
    }

    /// Rebuild a ledger from previously persisted blocks
    ///
    /// An empty block list yields a fresh genesis block so the chain is never
    /// empty. Linkage is not checked here; call [`Ledger::verify`].
    pub fn from_blocks(blocks: Vec<Block>, config: &Config) -> Self {
        let mut ledger = Self {
            chain: blocks,
            tokens: TokenGenerator::new(config.token_length),
            genesis_payload: config.genesis_payload.clone(),
        };

        if ledger.chain.is_empty() {
            tracing::info!("No persisted blocks, creating genesis block");
            ledger.push_genesis();
        }

        ledger
    }

    fn push_genesis(&mut self) {
        let genesis = Block {
            number: 0,
            token: self.tokens.generate(),
            previous_token: self.tokens.generate(),
            timestamp: Timestamp::now(),
            payload: self.genesis_payload.clone(),
        };

        tracing::debug!(token = %genesis.token, "Genesis block created");
        self.chain.push(genesis);
    }

    /// Append a new block carrying `payload`
    ///
    /// Fails only when the chain is empty, which is an invariant violation.
    pub fn append(&mut self, payload: impl Into<String>) -> Result<&Block> {
        let latest = self.latest_block()?;

        let block = Block {
            number: latest.number + 1,
            token: self.tokens.generate(),
            previous_token: latest.token.clone(),
            timestamp: Timestamp::now(),
            payload: payload.into(),
        };

        tracing::debug!(
            number = block.number,
            token = %block.token,
            "Block appended"
        );

        self.chain.push(block);
        self.latest_block()
    }

    /// Most recently appended block
    pub fn latest_block(&self) -> Result<&Block> {
        self.chain.last().ok_or_else(|| {
            tracing::error!("Ledger has no blocks");
            Error::InvariantViolation("Ledger is empty".to_string())
        })
    }

    /// Check predecessor linkage across the whole chain
    ///
    /// Timestamps and payloads are not covered: tokens are independent of
    /// block contents.
    pub fn verify(&self) -> bool {
        self.first_broken_link().is_none()
    }

    /// Position of the first block whose predecessor token does not match
    pub fn first_broken_link(&self) -> Option<usize> {
        self.chain
            .windows(2)
            .position(|pair| pair[1].previous_token != pair[0].token)
            .map(|index| index + 1)
    }

    /// All blocks in append order
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Iterate over blocks in append order
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.chain.iter()
    }

    /// Find a block by sequence number
    pub fn get(&self, number: u64) -> Option<&Block> {
        self.chain.iter().find(|block| block.number == number)
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false for a well-formed ledger
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Discard every block and start over from a new genesis block
    pub fn reset(&mut self) {
        self.chain.clear();
        self.push_genesis();
        tracing::info!("Ledger reset to genesis");
    }

    /// Write the chain to `path`, one block per line
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<usize> {
        let count = save_records(path.as_ref(), &self.chain)?;
        tracing::info!(blocks = count, file = %path.as_ref().display(), "Ledger persisted");
        Ok(count)
    }

    /// Restore a chain written by [`Ledger::persist`]
    ///
    /// Malformed lines are skipped; a file with no usable blocks yields a
    /// genesis-only ledger.
    pub fn restore(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let report = load_records::<Block>(path.as_ref())?;

        if report.skipped > 0 {
            tracing::warn!(
                skipped = report.skipped,
                "Ledger restored with malformed blocks skipped"
            );
        }

        let ledger = Self::from_blocks(report.records, config);

        if let Some(index) = ledger.first_broken_link() {
            tracing::warn!(position = index, "Restored ledger has a broken link");
        }

        tracing::info!(blocks = ledger.len(), "Ledger restored");
        Ok(ledger)
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.chain.iter()
    }
}
