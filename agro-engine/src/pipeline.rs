//! Transaction pipeline
//!
//! # Flow
//!
//! 1. Resolve supplier, retailer, product and transporter
//! 2. Check the supplier carries the product
//! 3. Check stock covers the quantity
//! 4. Price the order (unit price x quantity + distance x cost per km)
//! 5. Construct the transaction, consuming a transaction id
//! 6. Evaluate policies
//! 7. Deduct retailer credit
//! 8. Move stock, mark Completed
//!
//! Steps 1-4 fail with an [`Error`] and leave no trace. From step 5 on every
//! run ends with a stored transaction and exactly one ledger record, whether
//! it committed or not.

use crate::geo::km_to_decimal;
use crate::policy::{PolicyEngine, PolicyVerdict};
use crate::store::EntityStore;
use crate::types::{
    FailureReason, Transaction, TransactionOutcome, TransactionRequest, TransactionStatus,
    COMPLETED_PREFIX,
};
use crate::{Error, Result};
use agro_ledger::Ledger;
use rust_decimal::Decimal;

/// Run one order through the pipeline
pub fn execute(
    store: &mut EntityStore,
    ledger: &mut Ledger,
    policies: &PolicyEngine,
    request: &TransactionRequest,
) -> Result<TransactionOutcome> {
    if request.quantity == 0 {
        return Err(Error::InvalidQuantity);
    }

    // Steps 1-4 only read the store
    let (mut product, mut retailer, product_cost, transport_cost) = {
        let supplier = store.require_supplier(request.supplier_id)?;
        let retailer = store.require_retailer(request.retailer_id)?;
        let product = store.require_product(request.product_id)?;
        let transporter = store.require_transporter(request.transporter_id)?;

        if !supplier.supplies(product.id) {
            return Err(Error::SupplierDoesNotCarryProduct {
                supplier: supplier.id,
                product: product.id,
            });
        }

        if !product.has_stock(request.quantity) {
            return Err(Error::InsufficientStock {
                product: product.id,
                requested: request.quantity,
                available: product.stock,
            });
        }

        let cost_overflow = || Error::CostOverflow(format!("order for product {}", product.id));
        let product_cost = product
            .price
            .checked_mul(Decimal::from(request.quantity))
            .ok_or_else(cost_overflow)?;
        let distance = supplier.coordinates.distance_km(&retailer.coordinates);
        let transport_cost = transporter
            .transport_cost(km_to_decimal(distance))
            .ok_or_else(cost_overflow)?;
        product_cost
            .checked_add(transport_cost)
            .ok_or_else(cost_overflow)?;

        tracing::debug!(
            supplier_id = %supplier.id,
            retailer_id = %retailer.id,
            distance_km = distance,
            %product_cost,
            %transport_cost,
            "Order priced"
        );

        (product.clone(), retailer.clone(), product_cost, transport_cost)
    };

    let id = store.allocate_transaction_id()?;
    let mut transaction = Transaction::new(id, request, product_cost, transport_cost);

    if let PolicyVerdict::Rejected { policy, reason } = policies.evaluate(&transaction) {
        return finish(
            store,
            ledger,
            transaction,
            Some(FailureReason::PolicyRejected { policy, reason }),
        );
    }

    if !retailer.credit.deduct(transaction.total_cost) {
        tracing::warn!(
            transaction_id = %id,
            retailer_id = %retailer.id,
            required = %transaction.total_cost,
            available = %retailer.credit.current,
            "Insufficient credit"
        );
        let failure = FailureReason::InsufficientCredit {
            required: transaction.total_cost,
            available: retailer.credit.current,
        };
        return finish(store, ledger, transaction, Some(failure));
    }

    // Stock was checked above and nothing has touched it since
    product.stock -= request.quantity;

    store.replace_retailer(retailer);
    store.replace_product(product);

    transaction.status = TransactionStatus::Completed;
    finish(store, ledger, transaction, None)
}

/// Store the decided transaction and append its ledger record
fn finish(
    store: &mut EntityStore,
    ledger: &mut Ledger,
    mut transaction: Transaction,
    failure: Option<FailureReason>,
) -> Result<TransactionOutcome> {
    let prefix = match &failure {
        Some(reason) => {
            transaction.status = TransactionStatus::Failed;
            reason.ledger_prefix()
        }
        None => COMPLETED_PREFIX,
    };

    let payload = format!("{} | {}", prefix, transaction.block_data());
    let outcome = TransactionOutcome {
        transaction_id: transaction.id,
        status: transaction.status,
        failure,
    };

    store.record_transaction(transaction);
    ledger.append(payload)?;

    match &outcome.failure {
        None => tracing::info!(
            transaction_id = %outcome.transaction_id,
            "Transaction completed"
        ),
        Some(reason) => tracing::warn!(
            transaction_id = %outcome.transaction_id,
            %reason,
            "Transaction failed"
        ),
    }

    Ok(outcome)
}
