//! Data directory persistence
//!
//! # Files
//!
//! - `blockchain.dat` - ledger (name configurable)
//! - `products.dat`, `suppliers.dat`, `retailers.dat`, `transporters.dat`,
//!   `transactions.dat` - one record per line
//! - `nextids.dat` - five id counters: product, supplier, retailer,
//!   transporter, transaction
//!
//! The ledger file must exist; entity files that are missing load as empty
//! collections.

use crate::config::Config;
use crate::store::{EntityStore, IdCounters};
use crate::types::{Product, Retailer, Supplier, Transaction, Transporter};
use crate::Result;
use agro_ledger::{load_records, save_records, Ledger, LoadReport, Record};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Product file name
pub const PRODUCTS_FILE: &str = "products.dat";
/// Supplier file name
pub const SUPPLIERS_FILE: &str = "suppliers.dat";
/// Retailer file name
pub const RETAILERS_FILE: &str = "retailers.dat";
/// Transporter file name
pub const TRANSPORTERS_FILE: &str = "transporters.dat";
/// Transaction file name
pub const TRANSACTIONS_FILE: &str = "transactions.dat";
/// Id counter file name
pub const NEXT_IDS_FILE: &str = "nextids.dat";

/// What a load found on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Blocks in the restored ledger
    pub blocks: usize,
    /// Products loaded
    pub products: usize,
    /// Suppliers loaded
    pub suppliers: usize,
    /// Retailers loaded
    pub retailers: usize,
    /// Transporters loaded
    pub transporters: usize,
    /// Transactions loaded
    pub transactions: usize,
    /// Malformed entity lines skipped
    pub skipped: usize,
    /// Whether `nextids.dat` was present and readable
    pub counters_restored: bool,
}

fn load_optional<T: Record>(path: &Path, skipped: &mut usize) -> Result<Vec<T>> {
    if !path.exists() {
        tracing::info!(file = %path.display(), "Record file missing, starting empty");
        return Ok(Vec::new());
    }

    let LoadReport { records, skipped: bad } = load_records::<T>(path)?;
    *skipped += bad;
    Ok(records)
}

fn load_counters(path: &Path) -> Result<Option<IdCounters>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let counters = IdCounters::from_lines(&content);
    if counters.is_none() {
        tracing::warn!(file = %path.display(), "Unreadable id counters, deriving from records");
    }
    Ok(counters)
}

/// Restore the store and ledger from `config.data_dir`
pub fn load(config: &Config) -> Result<(EntityStore, Ledger, LoadSummary)> {
    let dir = &config.data_dir;
    let ledger = Ledger::restore(config.chain_path(), &config.ledger)?;

    let mut skipped = 0;
    let products: Vec<Product> = load_optional(&dir.join(PRODUCTS_FILE), &mut skipped)?;
    let suppliers: Vec<Supplier> = load_optional(&dir.join(SUPPLIERS_FILE), &mut skipped)?;
    let retailers: Vec<Retailer> = load_optional(&dir.join(RETAILERS_FILE), &mut skipped)?;
    let transporters: Vec<Transporter> =
        load_optional(&dir.join(TRANSPORTERS_FILE), &mut skipped)?;
    let transactions: Vec<Transaction> =
        load_optional(&dir.join(TRANSACTIONS_FILE), &mut skipped)?;
    let counters = load_counters(&dir.join(NEXT_IDS_FILE))?;

    let summary = LoadSummary {
        blocks: ledger.len(),
        products: products.len(),
        suppliers: suppliers.len(),
        retailers: retailers.len(),
        transporters: transporters.len(),
        transactions: transactions.len(),
        skipped,
        counters_restored: counters.is_some(),
    };

    let store = EntityStore::from_parts(
        products,
        suppliers,
        retailers,
        transporters,
        transactions,
        counters,
    );

    tracing::info!(?summary, dir = %dir.display(), "Data directory loaded");
    Ok((store, ledger, summary))
}

/// Write the store and ledger to `config.data_dir`, creating it if needed
pub fn save(config: &Config, store: &EntityStore, ledger: &Ledger) -> Result<()> {
    let dir = &config.data_dir;
    fs::create_dir_all(dir)?;

    ledger.persist(config.chain_path())?;
    save_records(dir.join(PRODUCTS_FILE), store.products())?;
    save_records(dir.join(SUPPLIERS_FILE), store.suppliers())?;
    save_records(dir.join(RETAILERS_FILE), store.retailers())?;
    save_records(dir.join(TRANSPORTERS_FILE), store.transporters())?;
    save_records(dir.join(TRANSACTIONS_FILE), store.transactions())?;
    fs::write(dir.join(NEXT_IDS_FILE), store.counters().to_lines())?;

    tracing::info!(dir = %dir.display(), blocks = ledger.len(), "Data directory saved");
    Ok(())
}
