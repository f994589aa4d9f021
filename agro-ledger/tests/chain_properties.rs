//! Property-based tests for chain invariants
//!
//! These tests use proptest to verify:
//! - Linkage: every appended block points at its predecessor
//! - Genesis: fresh and restored-from-empty ledgers hold exactly one block 0
//! - Corruption: breaking one link is reported at that exact position
//! - Persistence: persist/restore preserves every block

use agro_ledger::{Block, Config, Ledger};
use proptest::prelude::*;
use std::fs;

/// Strategy for block payloads, delimiter included
fn payload_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 :|,.]{0,40}"
}

fn build_ledger(payloads: &[String]) -> Ledger {
    let mut ledger = Ledger::new(&Config::default());
    for payload in payloads {
        ledger.append(payload.clone()).unwrap();
    }
    ledger
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: N appends yield N + 1 contiguous, fully linked blocks
    #[test]
    fn prop_appends_are_linked(payloads in prop::collection::vec(payload_strategy(), 0..40)) {
        let ledger = build_ledger(&payloads);

        prop_assert_eq!(ledger.len(), payloads.len() + 1);
        prop_assert!(ledger.verify());

        for (index, block) in ledger.iter().enumerate() {
            prop_assert_eq!(block.number, index as u64);
        }
        for pair in ledger.blocks().windows(2) {
            prop_assert_eq!(&pair[1].previous_token, &pair[0].token);
        }
    }

    /// Property: a single broken link is found at its exact position
    #[test]
    fn prop_broken_link_located(
        payloads in prop::collection::vec(payload_strategy(), 2..30),
        pick in any::<prop::sample::Index>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blockchain.dat");

        let ledger = build_ledger(&payloads);
        ledger.persist(&path).unwrap();

        // Corrupt the predecessor token of one non-genesis block on disk
        let target = 1 + pick.index(ledger.len() - 1);
        let content = fs::read_to_string(&path).unwrap();
        let rewritten: Vec<String> = content
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == target {
                    let mut fields: Vec<&str> = line.splitn(5, '|').collect();
                    fields[2] = "corrupted!";
                    fields.join("|")
                } else {
                    line.to_string()
                }
            })
            .collect();
        fs::write(&path, rewritten.join("\n")).unwrap();

        let restored = Ledger::restore(&path, &Config::default()).unwrap();
        prop_assert!(!restored.verify());
        prop_assert_eq!(restored.first_broken_link(), Some(target));
    }

    /// Property: persist then restore reproduces the chain exactly
    #[test]
    fn prop_persist_restore_identity(payloads in prop::collection::vec(payload_strategy(), 0..25)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blockchain.dat");

        let ledger = build_ledger(&payloads);
        ledger.persist(&path).unwrap();

        let restored = Ledger::restore(&path, &Config::default()).unwrap();
        prop_assert_eq!(restored.blocks(), ledger.blocks());
    }
}

#[test]
fn test_fresh_ledger_genesis_invariant() {
    let ledger = Ledger::new(&Config::default());
    let blocks: Vec<&Block> = ledger.iter().collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].number, 0);
}

#[test]
fn test_restore_from_blank_lines_creates_genesis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blockchain.dat");
    fs::write(&path, "\n\n").unwrap();

    let ledger = Ledger::restore(&path, &Config::default()).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.blocks()[0].number, 0);
}

#[test]
fn test_restore_skips_malformed_block_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blockchain.dat");

    let mut ledger = Ledger::new(&Config::default());
    ledger.append("one").unwrap();
    ledger.append("two").unwrap();
    ledger.persist(&path).unwrap();

    // Drop the middle block's timestamp so its line no longer decodes
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<String> = content
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 1 {
                line.replacen(ledger.blocks()[1].timestamp.as_str(), "not-a-time", 1)
            } else {
                line.to_string()
            }
        })
        .collect();
    fs::write(&path, lines.join("\n")).unwrap();

    let restored = Ledger::restore(&path, &Config::default()).unwrap();
    assert_eq!(restored.len(), 2);
    // The gap left by the skipped block shows up as a broken link
    assert_eq!(restored.first_broken_link(), Some(1));
}

#[test]
fn test_custom_token_length() {
    let config = Config {
        token_length: 24,
        ..Default::default()
    };
    let mut ledger = Ledger::new(&config);
    let block = ledger.append("sized").unwrap();
    assert_eq!(block.token.as_str().len(), 24);
}
