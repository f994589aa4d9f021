//! Entity store
//!
//! Keyed collections for every entity kind plus the id counters. The store
//! never hands out mutable references: callers fetch an owned copy, change
//! it, and write it back under the same id.

use crate::geo::GeoPoint;
use crate::types::{
    CreditAccount, EntityKind, Product, ProductId, Retailer, RetailerId, Supplier, SupplierId,
    Transaction, TransactionId, Transporter, TransporterId,
};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Next id to assign per entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    /// Next product id
    pub product: u32,
    /// Next supplier id
    pub supplier: u32,
    /// Next retailer id
    pub retailer: u32,
    /// Next transporter id
    pub transporter: u32,
    /// Next transaction id
    pub transaction: u32,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            product: 1,
            supplier: 1,
            retailer: 1,
            transporter: 1,
            transaction: 1,
        }
    }
}

impl IdCounters {
    /// Counters as persisted, one per line
    pub fn to_lines(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.product, self.supplier, self.retailer, self.transporter, self.transaction
        )
    }

    /// Parse five counter lines, `None` if any is missing, zero or not a number
    pub fn from_lines(content: &str) -> Option<Self> {
        let mut values = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim().parse::<u32>());

        let mut next = || values.next()?.ok().filter(|&value| value > 0);
        Some(Self {
            product: next()?,
            supplier: next()?,
            retailer: next()?,
            transporter: next()?,
            transaction: next()?,
        })
    }

    /// Raise every counter to at least the matching one in `other`
    pub fn max(self, other: IdCounters) -> Self {
        Self {
            product: self.product.max(other.product),
            supplier: self.supplier.max(other.supplier),
            retailer: self.retailer.max(other.retailer),
            transporter: self.transporter.max(other.transporter),
            transaction: self.transaction.max(other.transaction),
        }
    }
}

/// Hand out `*counter` and advance it
///
/// The last value of the id space is never handed out, so the counter can
/// always name the next id.
fn take_id(counter: &mut u32, kind: EntityKind) -> Result<u32> {
    let id = *counter;
    *counter = id.checked_add(1).ok_or_else(|| {
        tracing::error!(%kind, "Id space exhausted");
        Error::IdsExhausted(kind)
    })?;
    Ok(id)
}

/// Reject free text that would break the flat-file encoding
fn check_text(kind: EntityKind, field: &str, value: &str, required: bool) -> Result<()> {
    if required && value.trim().is_empty() {
        return Err(Error::invalid(kind, format!("{} must not be empty", field)));
    }
    if value.contains(|c: char| c == '|' || c == '\n' || c == '\r') {
        return Err(Error::invalid(
            kind,
            format!("{} must not contain '|' or line breaks", field),
        ));
    }
    Ok(())
}

/// Owning store for catalog entities and transactions
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    products: BTreeMap<ProductId, Product>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    retailers: BTreeMap<RetailerId, Retailer>,
    transporters: BTreeMap<TransporterId, Transporter>,
    transactions: BTreeMap<TransactionId, Transaction>,
    counters: IdCounters,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from loaded records
    ///
    /// Counters resume at the larger of `counters` (when given) and one past
    /// the highest loaded id of each kind. A repeated id keeps the later record.
    pub fn from_parts(
        products: Vec<Product>,
        suppliers: Vec<Supplier>,
        retailers: Vec<Retailer>,
        transporters: Vec<Transporter>,
        transactions: Vec<Transaction>,
        counters: Option<IdCounters>,
    ) -> Self {
        let mut store = Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            suppliers: suppliers.into_iter().map(|s| (s.id, s)).collect(),
            retailers: retailers.into_iter().map(|r| (r.id, r)).collect(),
            transporters: transporters.into_iter().map(|t| (t.id, t)).collect(),
            transactions: transactions.into_iter().map(|t| (t.id, t)).collect(),
            counters: IdCounters::default(),
        };

        let derived = store.derived_counters();
        store.counters = match counters {
            Some(persisted) => {
                if persisted.max(derived) != persisted {
                    tracing::warn!(
                        ?persisted,
                        ?derived,
                        "Persisted id counters behind loaded records, advancing"
                    );
                }
                persisted.max(derived)
            }
            None => derived,
        };

        store
    }

    fn derived_counters(&self) -> IdCounters {
        fn next_after<K: Copy + Into<u32>, V>(map: &BTreeMap<K, V>) -> u32 {
            map.keys()
                .next_back()
                .map_or(1, |&id| Into::<u32>::into(id).saturating_add(1))
        }

        IdCounters {
            product: next_after(&self.products),
            supplier: next_after(&self.suppliers),
            retailer: next_after(&self.retailers),
            transporter: next_after(&self.transporters),
            transaction: next_after(&self.transactions),
        }
    }

    /// Current id counters
    pub fn counters(&self) -> IdCounters {
        self.counters
    }

    /// Drop every entity and restart all counters at 1
    pub fn reset(&mut self) {
        *self = Self::default();
        tracing::info!("Entity store reset");
    }

    // ===== Catalog =====

    /// Add a product and return its id
    pub fn add_product(&mut self, name: &str, price: Decimal, stock: u32) -> Result<ProductId> {
        check_text(EntityKind::Product, "name", name, true)?;
        if price < Decimal::ZERO {
            return Err(Error::invalid(EntityKind::Product, "price must not be negative"));
        }

        let id = ProductId(take_id(&mut self.counters.product, EntityKind::Product)?);
        self.products.insert(
            id,
            Product {
                id,
                name: name.to_string(),
                price,
                stock,
            },
        );

        tracing::info!(product_id = %id, name, "Product added");
        Ok(id)
    }

    /// Add a supplier with an empty product list and return its id
    pub fn add_supplier(
        &mut self,
        name: &str,
        location: &str,
        branch: &str,
        coordinates: GeoPoint,
    ) -> Result<SupplierId> {
        check_text(EntityKind::Supplier, "name", name, true)?;
        check_text(EntityKind::Supplier, "location", location, false)?;
        check_text(EntityKind::Supplier, "branch", branch, false)?;

        let id = SupplierId(take_id(&mut self.counters.supplier, EntityKind::Supplier)?);
        self.suppliers.insert(
            id,
            Supplier {
                id,
                name: name.to_string(),
                location: location.to_string(),
                branch: branch.to_string(),
                coordinates,
                product_ids: Vec::new(),
            },
        );

        tracing::info!(supplier_id = %id, name, "Supplier added");
        Ok(id)
    }

    /// Add a retailer with an empty product list and return its id
    pub fn add_retailer(
        &mut self,
        name: &str,
        location: &str,
        coordinates: GeoPoint,
        credit: CreditAccount,
    ) -> Result<RetailerId> {
        check_text(EntityKind::Retailer, "name", name, true)?;
        check_text(EntityKind::Retailer, "location", location, false)?;
        if credit.current < Decimal::ZERO || credit.annual < Decimal::ZERO {
            return Err(Error::invalid(
                EntityKind::Retailer,
                "credit balances must not be negative",
            ));
        }

        let id = RetailerId(take_id(&mut self.counters.retailer, EntityKind::Retailer)?);
        self.retailers.insert(
            id,
            Retailer {
                id,
                name: name.to_string(),
                location: location.to_string(),
                coordinates,
                credit,
                product_ids: Vec::new(),
            },
        );

        tracing::info!(retailer_id = %id, name, "Retailer added");
        Ok(id)
    }

    /// Add a transporter and return its id
    pub fn add_transporter(
        &mut self,
        name: &str,
        transport_type: &str,
        cost_per_km: Decimal,
        max_capacity: f64,
    ) -> Result<TransporterId> {
        check_text(EntityKind::Transporter, "name", name, true)?;
        check_text(EntityKind::Transporter, "transport type", transport_type, false)?;
        if cost_per_km <= Decimal::ZERO {
            return Err(Error::invalid(
                EntityKind::Transporter,
                "cost per km must be positive",
            ));
        }
        if !(max_capacity.is_finite() && max_capacity > 0.0) {
            return Err(Error::invalid(
                EntityKind::Transporter,
                "max capacity must be positive",
            ));
        }

        let id = TransporterId(take_id(&mut self.counters.transporter, EntityKind::Transporter)?);
        self.transporters.insert(
            id,
            Transporter {
                id,
                name: name.to_string(),
                transport_type: transport_type.to_string(),
                cost_per_km,
                max_capacity,
            },
        );

        tracing::info!(transporter_id = %id, name, "Transporter added");
        Ok(id)
    }

    /// Append `product` to a supplier's product list
    pub fn link_supplier_product(&mut self, supplier: SupplierId, product: ProductId) -> Result<()> {
        self.require_product(product)?;
        let entry = self
            .suppliers
            .get_mut(&supplier)
            .ok_or_else(|| Error::not_found(EntityKind::Supplier, supplier))?;
        entry.product_ids.push(product);

        tracing::debug!(supplier_id = %supplier, product_id = %product, "Supplier product linked");
        Ok(())
    }

    /// Append `product` to a retailer's product list
    pub fn link_retailer_product(&mut self, retailer: RetailerId, product: ProductId) -> Result<()> {
        self.require_product(product)?;
        let entry = self
            .retailers
            .get_mut(&retailer)
            .ok_or_else(|| Error::not_found(EntityKind::Retailer, retailer))?;
        entry.product_ids.push(product);

        tracing::debug!(retailer_id = %retailer, product_id = %product, "Retailer product linked");
        Ok(())
    }

    /// Increase both credit balances of a retailer by `amount`
    pub fn top_up_credit(&mut self, retailer: RetailerId, amount: Decimal) -> Result<&Retailer> {
        if amount <= Decimal::ZERO {
            return Err(Error::invalid(
                EntityKind::Retailer,
                "top-up amount must be positive",
            ));
        }

        let mut updated = self.require_retailer(retailer)?.clone();
        if !updated.credit.top_up(amount) {
            return Err(Error::invalid(
                EntityKind::Retailer,
                "top-up would overflow the credit balance",
            ));
        }
        self.replace_retailer(updated);

        tracing::info!(retailer_id = %retailer, %amount, "Credit topped up");
        self.require_retailer(retailer)
    }

    // ===== Lookups =====

    /// Product by id
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    /// Supplier by id
    pub fn supplier(&self, id: SupplierId) -> Option<&Supplier> {
        self.suppliers.get(&id)
    }

    /// Retailer by id
    pub fn retailer(&self, id: RetailerId) -> Option<&Retailer> {
        self.retailers.get(&id)
    }

    /// Transporter by id
    pub fn transporter(&self, id: TransporterId) -> Option<&Transporter> {
        self.transporters.get(&id)
    }

    /// Transaction by id
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    /// Product by id, or a not-found error
    pub fn require_product(&self, id: ProductId) -> Result<&Product> {
        self.product(id)
            .ok_or_else(|| Error::not_found(EntityKind::Product, id))
    }

    /// Supplier by id, or a not-found error
    pub fn require_supplier(&self, id: SupplierId) -> Result<&Supplier> {
        self.supplier(id)
            .ok_or_else(|| Error::not_found(EntityKind::Supplier, id))
    }

    /// Retailer by id, or a not-found error
    pub fn require_retailer(&self, id: RetailerId) -> Result<&Retailer> {
        self.retailer(id)
            .ok_or_else(|| Error::not_found(EntityKind::Retailer, id))
    }

    /// Transporter by id, or a not-found error
    pub fn require_transporter(&self, id: TransporterId) -> Result<&Transporter> {
        self.transporter(id)
            .ok_or_else(|| Error::not_found(EntityKind::Transporter, id))
    }

    /// Products in ascending id order
    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.products.values()
    }

    /// Suppliers in ascending id order
    pub fn suppliers(&self) -> impl Iterator<Item = &Supplier> + '_ {
        self.suppliers.values()
    }

    /// Retailers in ascending id order
    pub fn retailers(&self) -> impl Iterator<Item = &Retailer> + '_ {
        self.retailers.values()
    }

    /// Transporters in ascending id order
    pub fn transporters(&self) -> impl Iterator<Item = &Transporter> + '_ {
        self.transporters.values()
    }

    /// Transactions in ascending id order
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions.values()
    }

    /// Number of stored transactions
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    // ===== Pipeline support =====

    /// Hand out the next transaction id
    pub(crate) fn allocate_transaction_id(&mut self) -> Result<TransactionId> {
        take_id(&mut self.counters.transaction, EntityKind::Transaction).map(TransactionId)
    }

    /// Store a decided transaction
    pub(crate) fn record_transaction(&mut self, transaction: Transaction) {
        self.transactions.insert(transaction.id, transaction);
    }

    /// Write back a product under its id
    pub(crate) fn replace_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    /// Write back a retailer under its id
    pub(crate) fn replace_retailer(&mut self, retailer: Retailer) {
        self.retailers.insert(retailer.id, retailer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> GeoPoint {
        GeoPoint::new(3.1, 101.7).unwrap()
    }

    #[test]
    fn test_ids_are_sequential_per_kind() {
        let mut store = EntityStore::new();
        assert_eq!(store.add_product("Rice", Decimal::new(550, 2), 1000).unwrap(), ProductId(1));
        assert_eq!(store.add_product("Fruits", Decimal::from(3), 500).unwrap(), ProductId(2));
        assert_eq!(
            store.add_supplier("Malayan Agro", "Kuala Lumpur", "HQ", point()).unwrap(),
            SupplierId(1)
        );
        assert_eq!(store.counters().product, 3);
        assert_eq!(store.counters().supplier, 2);
        assert_eq!(store.counters().retailer, 1);
    }

    #[test]
    fn test_validation_failures_consume_no_id() {
        let mut store = EntityStore::new();
        assert!(store.add_product("", Decimal::ONE, 1).is_err());
        assert!(store.add_product("Rice", Decimal::from(-1), 1).is_err());
        assert!(store.add_product("Rice|Brown", Decimal::ONE, 1).is_err());
        assert!(store
            .add_transporter("Truck Co", "Truck", Decimal::ZERO, 100.0)
            .is_err());
        assert!(store
            .add_transporter("Truck Co", "Truck", Decimal::ONE, 0.0)
            .is_err());
        assert_eq!(store.counters(), IdCounters::default());
    }

    #[test]
    fn test_link_products_keeps_duplicates() {
        let mut store = EntityStore::new();
        let product = store.add_product("Rice", Decimal::ONE, 10).unwrap();
        let supplier = store.add_supplier("Agro", "KL", "HQ", point()).unwrap();

        store.link_supplier_product(supplier, product).unwrap();
        store.link_supplier_product(supplier, product).unwrap();
        assert_eq!(store.supplier(supplier).unwrap().product_ids, vec![product, product]);

        assert!(matches!(
            store.link_supplier_product(supplier, ProductId(9)),
            Err(Error::NotFound { kind: EntityKind::Product, id: 9 })
        ));
        assert!(matches!(
            store.link_retailer_product(RetailerId(4), product),
            Err(Error::NotFound { kind: EntityKind::Retailer, id: 4 })
        ));
    }

    #[test]
    fn test_top_up_credit() {
        let mut store = EntityStore::new();
        let retailer = store
            .add_retailer(
                "FreshMart",
                "PJ",
                point(),
                CreditAccount::new(Decimal::from(100), Decimal::from(1000)),
            )
            .unwrap();

        let updated = store.top_up_credit(retailer, Decimal::from(50)).unwrap();
        assert_eq!(updated.credit.current, Decimal::from(150));
        assert_eq!(updated.credit.annual, Decimal::from(1050));

        assert!(store.top_up_credit(retailer, Decimal::ZERO).is_err());
        assert!(store.top_up_credit(RetailerId(2), Decimal::ONE).is_err());
    }

    #[test]
    fn test_from_parts_derives_counters() {
        let products = vec![
            Product { id: ProductId(4), name: "A".into(), price: Decimal::ONE, stock: 1 },
            Product { id: ProductId(2), name: "B".into(), price: Decimal::ONE, stock: 1 },
        ];
        let store = EntityStore::from_parts(products, vec![], vec![], vec![], vec![], None);

        assert_eq!(store.counters().product, 5);
        assert_eq!(store.counters().supplier, 1);
        let ids: Vec<ProductId> = store.products().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProductId(2), ProductId(4)]);
    }

    #[test]
    fn test_from_parts_never_reuses_ids() {
        let products = vec![Product { id: ProductId(7), name: "A".into(), price: Decimal::ONE, stock: 1 }];
        let persisted = IdCounters { product: 3, transaction: 20, ..Default::default() };
        let store = EntityStore::from_parts(products, vec![], vec![], vec![], vec![], Some(persisted));

        assert_eq!(store.counters().product, 8);
        assert_eq!(store.counters().transaction, 20);
    }

    #[test]
    fn test_counter_lines() {
        let counters = IdCounters { product: 4, supplier: 3, retailer: 5, transporter: 2, transaction: 9 };
        assert_eq!(IdCounters::from_lines(&counters.to_lines()), Some(counters));
        assert_eq!(IdCounters::from_lines("1\n2\n3\n"), None);
        assert_eq!(IdCounters::from_lines("1\n2\nx\n4\n5\n"), None);
        assert_eq!(IdCounters::from_lines("1\n2\n0\n4\n5\n"), None);
    }

    #[test]
    fn test_exhausted_counter_is_an_error() {
        let counters = IdCounters { product: u32::MAX, transaction: u32::MAX, ..Default::default() };
        let mut store = EntityStore::from_parts(vec![], vec![], vec![], vec![], vec![], Some(counters));

        assert!(matches!(
            store.add_product("Rice", Decimal::ONE, 10),
            Err(Error::IdsExhausted(EntityKind::Product))
        ));
        assert!(matches!(
            store.allocate_transaction_id(),
            Err(Error::IdsExhausted(EntityKind::Transaction))
        ));
        assert_eq!(store.products().count(), 0);
        assert_eq!(store.counters().product, u32::MAX);

        // Other kinds are unaffected
        assert_eq!(store.add_supplier("Agro", "KL", "HQ", point()).unwrap(), SupplierId(1));
    }

    #[test]
    fn test_highest_id_does_not_overflow_counters() {
        let products = vec![Product { id: ProductId(u32::MAX), name: "A".into(), price: Decimal::ONE, stock: 1 }];
        let mut store = EntityStore::from_parts(products, vec![], vec![], vec![], vec![], None);

        assert_eq!(store.counters().product, u32::MAX);
        assert!(store.add_product("Rice", Decimal::ONE, 10).is_err());
    }

    #[test]
    fn test_reset() {
        let mut store = EntityStore::new();
        store.add_product("Rice", Decimal::ONE, 10).unwrap();
        store.allocate_transaction_id().unwrap();

        store.reset();
        assert_eq!(store.products().count(), 0);
        assert_eq!(store.counters(), IdCounters::default());
    }
}
