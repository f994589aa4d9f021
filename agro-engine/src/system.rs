//! Distribution system orchestration
//!
//! [`DistributionSystem`] holds every piece of mutable state: the entity
//! store, the ledger, the policy engine and metrics. Each operation runs to
//! completion on `&mut self`; ledger appends always follow the entity
//! mutation they describe.

use crate::config::Config;
use crate::geo::GeoPoint;
use crate::inventory::{AllocationPlan, Allocator};
use crate::metrics::Metrics;
use crate::persistence::{self, LoadSummary};
use crate::pipeline;
use crate::policy::{Policy, PolicyEngine};
use crate::report::DistributionReport;
use crate::routing::{self, RouteCost, RoutePlan};
use crate::store::EntityStore;
use crate::types::{
    CreditAccount, EntityKind, ProductId, Retailer, RetailerId, SupplierId, TransactionOutcome,
    TransactionRequest, TransporterId,
};
use crate::{Error, Result};
use agro_ledger::Ledger;
use rust_decimal::Decimal;

/// Complete distribution system state
#[derive(Debug)]
pub struct DistributionSystem {
    config: Config,
    store: EntityStore,
    ledger: Ledger,
    policies: PolicyEngine,
    metrics: Metrics,
}

impl DistributionSystem {
    /// Create an empty system with a fresh ledger
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let ledger = Ledger::new(&config.ledger);
        Self::assemble(config, EntityStore::new(), ledger)
    }

    /// Open a system persisted under `config.data_dir`
    ///
    /// Fails with an I/O error when the ledger file is missing.
    pub fn open(config: Config) -> Result<(Self, LoadSummary)> {
        config.validate()?;
        let (store, ledger, summary) = persistence::load(&config)?;

        if !ledger.verify() {
            tracing::error!(
                position = ?ledger.first_broken_link(),
                "Ledger linkage broken on open"
            );
        }

        Ok((Self::assemble(config, store, ledger)?, summary))
    }

    /// Open the data directory if it holds a ledger, otherwise start empty
    pub fn open_or_create(config: Config) -> Result<Self> {
        if config.chain_path().exists() {
            Ok(Self::open(config)?.0)
        } else {
            tracing::info!(dir = %config.data_dir.display(), "No ledger found, starting new system");
            Self::new(config)
        }
    }

    fn assemble(config: Config, store: EntityStore, ledger: Ledger) -> Result<Self> {
        let policies = PolicyEngine::from_config(&config.policy);
        let metrics = Metrics::new()?;
        metrics.set_ledger_blocks(ledger.len());

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            blocks = ledger.len(),
            "Distribution system ready"
        );

        Ok(Self {
            config,
            store,
            ledger,
            policies,
            metrics,
        })
    }

    /// Write all state to the data directory
    pub fn save(&self) -> Result<()> {
        persistence::save(&self.config, &self.store, &self.ledger)
    }

    /// Clear every entity and restart the ledger from a new genesis block
    pub fn reset(&mut self) {
        self.store.reset();
        self.ledger.reset();
        self.metrics.set_ledger_blocks(self.ledger.len());
        tracing::warn!("Distribution system reset");
    }

    // ===== Accessors =====

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Entity store
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Policy engine
    pub fn policies(&self) -> &PolicyEngine {
        &self.policies
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Add a policy evaluated after the configured ones
    pub fn register_policy(&mut self, policy: impl Policy + 'static) {
        self.policies.register(policy);
    }

    fn append(&mut self, payload: String) -> Result<()> {
        self.ledger.append(payload)?;
        self.metrics.set_ledger_blocks(self.ledger.len());
        Ok(())
    }

    // ===== Catalog =====

    /// Add a product and record it
    pub fn add_product(&mut self, name: &str, price: Decimal, stock: u32) -> Result<ProductId> {
        let id = self.store.add_product(name, price, stock)?;
        let summary = self.store.require_product(id)?.summary();
        self.append(format!("Added Product | {}", summary))?;
        Ok(id)
    }

    /// Add a supplier carrying `products` and record it
    pub fn add_supplier(
        &mut self,
        name: &str,
        location: &str,
        branch: &str,
        coordinates: GeoPoint,
        products: &[ProductId],
    ) -> Result<SupplierId> {
        if let Some(missing) = products.iter().find(|p| self.store.product(**p).is_none()) {
            return Err(Error::not_found(EntityKind::Product, *missing));
        }

        let id = self.store.add_supplier(name, location, branch, coordinates)?;
        for product in products {
            self.store.link_supplier_product(id, *product)?;
        }

        let summary = self.store.require_supplier(id)?.summary();
        self.append(format!("Added Supplier | {}", summary))?;
        Ok(id)
    }

    /// Add a retailer and record it
    pub fn add_retailer(
        &mut self,
        name: &str,
        location: &str,
        coordinates: GeoPoint,
        credit: CreditAccount,
    ) -> Result<RetailerId> {
        let id = self.store.add_retailer(name, location, coordinates, credit)?;
        let summary = self.store.require_retailer(id)?.summary();
        self.append(format!("Added Retailer | {}", summary))?;
        Ok(id)
    }

    /// Add a transporter and record it
    pub fn add_transporter(
        &mut self,
        name: &str,
        transport_type: &str,
        cost_per_km: Decimal,
        max_capacity: f64,
    ) -> Result<TransporterId> {
        let id = self
            .store
            .add_transporter(name, transport_type, cost_per_km, max_capacity)?;
        let summary = self.store.require_transporter(id)?.summary();
        self.append(format!("Added Transporter | {}", summary))?;
        Ok(id)
    }

    /// Let a supplier ship an additional product
    pub fn link_supplier_product(&mut self, supplier: SupplierId, product: ProductId) -> Result<()> {
        self.store.link_supplier_product(supplier, product)
    }

    /// Associate a product with a retailer
    pub fn link_retailer_product(&mut self, retailer: RetailerId, product: ProductId) -> Result<()> {
        self.store.link_retailer_product(retailer, product)
    }

    /// Raise both credit balances of a retailer and record it
    pub fn top_up_credit(&mut self, retailer: RetailerId, amount: Decimal) -> Result<Retailer> {
        let updated = self.store.top_up_credit(retailer, amount)?.clone();
        self.append(format!(
            "Credit Top-Up | Retailer ID: {} | Amount: RM{:.2} | Credit Balance: RM{:.2} | Annual Credit: RM{:.2}",
            retailer, amount, updated.credit.current, updated.credit.annual
        ))?;
        Ok(updated)
    }

    // ===== Transactions =====

    /// Run an order through the transaction pipeline
    pub fn create_transaction(&mut self, request: &TransactionRequest) -> Result<TransactionOutcome> {
        let outcome = pipeline::execute(&mut self.store, &mut self.ledger, &self.policies, request)?;
        self.metrics.observe_outcome(&outcome);
        self.metrics.set_ledger_blocks(self.ledger.len());
        Ok(outcome)
    }

    // ===== Analytics =====

    /// Plan a delivery tour from `supplier` through every retailer
    pub fn optimize_route(&self, supplier: SupplierId) -> Result<RoutePlan> {
        let supplier = self.store.require_supplier(supplier)?;
        let retailers: Vec<&Retailer> = self.store.retailers().collect();
        routing::plan_route(supplier, &retailers)
    }

    /// Price a route with `transporter` and record it
    pub fn record_route(&mut self, plan: RoutePlan, transporter: TransporterId) -> Result<RouteCost> {
        let cost_per_km = self.store.require_transporter(transporter)?.cost_per_km;
        let cost = routing::price_route(plan, transporter, cost_per_km)?;
        self.append(cost.ledger_payload())?;
        Ok(cost)
    }

    /// Plan how a product's stock should be spread over all retailers
    pub fn allocate_inventory(&self, product: ProductId) -> Result<AllocationPlan> {
        let product = self.store.require_product(product)?;
        let retailers: Vec<&Retailer> = self.store.retailers().collect();
        Allocator::new(&self.config.inventory).allocate(
            product,
            &retailers,
            self.store.transactions(),
        )
    }

    /// Record an allocation plan
    pub fn record_allocation(&mut self, plan: &AllocationPlan) -> Result<()> {
        self.append(plan.ledger_payload())
    }

    /// Summarize completed and failed transactions
    pub fn distribution_report(&self) -> DistributionReport {
        DistributionReport::from_store(&self.store)
    }
}
