//! Flat-file encodings for catalog entities and transactions
//!
//! | Kind        | Line                                                                 |
//! |-------------|----------------------------------------------------------------------|
//! | Product     | `id\|name\|price\|stock`                                             |
//! | Supplier    | `id\|name\|location\|branch\|lat\|lon\|productId,...`                |
//! | Retailer    | `id\|name\|location\|lat\|lon\|credit\|annualCredit\|productId,...`  |
//! | Transporter | `id\|name\|type\|costPerKm\|maxCapacity`                             |
//! | Transaction | `id\|supplier\|retailer\|product\|transporter\|qty\|productCost\|transportCost\|totalCost\|timestamp\|status\|orderType` |
//!
//! Product-id lists are optional on read: a supplier or retailer line that
//! stops after its coordinates or balances loads with an empty list.
//!
//! Decoding enforces the same ranges as creating an entity, so a line with a
//! negative price or a non-positive transport rate is malformed. Record ids
//! must lie in `1..u32::MAX`.

use crate::geo::GeoPoint;
use crate::types::{
    CreditAccount, Product, Retailer, Supplier, Transaction, Transporter,
};
use agro_ledger::{
    storage::{join_list, parse_field, parse_list},
    Error as RecordError, Record, Result as RecordResult, Timestamp,
};
use rust_decimal::Decimal;
use std::num::ParseIntError;
use std::str::FromStr;

/// Parse a record's own id, rejecting 0 and the last value of the id space
fn record_id<T>(kind: &'static str, value: &str) -> RecordResult<T>
where
    T: FromStr<Err = ParseIntError> + Into<u32> + Copy,
{
    let id: T = parse_field(kind, "id", value)?;
    let raw: u32 = id.into();
    if raw == 0 || raw == u32::MAX {
        return Err(RecordError::malformed(kind, format!("id {} out of range", raw)));
    }
    Ok(id)
}

/// Parse an amount that must be at least zero
fn non_negative(kind: &'static str, name: &str, value: &str) -> RecordResult<Decimal> {
    let amount: Decimal = parse_field(kind, name, value)?;
    if amount < Decimal::ZERO {
        return Err(RecordError::malformed(kind, format!("negative {} {}", name, amount)));
    }
    Ok(amount)
}

fn coordinates(kind: &'static str, lat: &str, lon: &str) -> RecordResult<GeoPoint> {
    let latitude = parse_field(kind, "latitude", lat)?;
    let longitude = parse_field(kind, "longitude", lon)?;
    GeoPoint::new(latitude, longitude).map_err(|e| RecordError::malformed(kind, e.to_string()))
}

impl Record for Product {
    const KIND: &'static str = "product";
    const MIN_FIELDS: usize = 4;

    fn to_line(&self) -> String {
        format!("{}|{}|{}|{}", self.id, self.name, self.price, self.stock)
    }

    fn from_fields(fields: &[&str]) -> RecordResult<Self> {
        Ok(Product {
            id: record_id(Self::KIND, fields[0])?,
            name: fields[1].to_string(),
            price: non_negative(Self::KIND, "price", fields[2])?,
            stock: parse_field(Self::KIND, "stock", fields[3])?,
        })
    }
}

impl Record for Supplier {
    const KIND: &'static str = "supplier";
    const MIN_FIELDS: usize = 6;

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.id,
            self.name,
            self.location,
            self.branch,
            self.coordinates.latitude(),
            self.coordinates.longitude(),
            join_list(&self.product_ids)
        )
    }

    fn from_fields(fields: &[&str]) -> RecordResult<Self> {
        let product_ids = match fields.get(6) {
            Some(list) => parse_list(Self::KIND, "product id", list)?,
            None => Vec::new(),
        };

        Ok(Supplier {
            id: record_id(Self::KIND, fields[0])?,
            name: fields[1].to_string(),
            location: fields[2].to_string(),
            branch: fields[3].to_string(),
            coordinates: coordinates(Self::KIND, fields[4], fields[5])?,
            product_ids,
        })
    }
}

impl Record for Retailer {
    const KIND: &'static str = "retailer";
    const MIN_FIELDS: usize = 7;

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.id,
            self.name,
            self.location,
            self.coordinates.latitude(),
            self.coordinates.longitude(),
            self.credit.current,
            self.credit.annual,
            join_list(&self.product_ids)
        )
    }

    fn from_fields(fields: &[&str]) -> RecordResult<Self> {
        let product_ids = match fields.get(7) {
            Some(list) => parse_list(Self::KIND, "product id", list)?,
            None => Vec::new(),
        };

        // Deductions only ever check the current balance, so a retailer whose
        // annual balance started below it can legitimately end up negative.
        Ok(Retailer {
            id: record_id(Self::KIND, fields[0])?,
            name: fields[1].to_string(),
            location: fields[2].to_string(),
            coordinates: coordinates(Self::KIND, fields[3], fields[4])?,
            credit: CreditAccount::new(
                non_negative(Self::KIND, "credit balance", fields[5])?,
                parse_field(Self::KIND, "annual credit balance", fields[6])?,
            ),
            product_ids,
        })
    }
}

impl Record for Transporter {
    const KIND: &'static str = "transporter";
    const MIN_FIELDS: usize = 5;

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.id, self.name, self.transport_type, self.cost_per_km, self.max_capacity
        )
    }

    fn from_fields(fields: &[&str]) -> RecordResult<Self> {
        let cost_per_km: Decimal = parse_field(Self::KIND, "cost per km", fields[3])?;
        if cost_per_km <= Decimal::ZERO {
            return Err(RecordError::malformed(
                Self::KIND,
                format!("cost per km {} must be positive", cost_per_km),
            ));
        }

        let max_capacity: f64 = parse_field(Self::KIND, "max capacity", fields[4])?;
        if !(max_capacity.is_finite() && max_capacity > 0.0) {
            return Err(RecordError::malformed(
                Self::KIND,
                format!("max capacity {} must be positive", max_capacity),
            ));
        }

        Ok(Transporter {
            id: record_id(Self::KIND, fields[0])?,
            name: fields[1].to_string(),
            transport_type: fields[2].to_string(),
            cost_per_km,
            max_capacity,
        })
    }
}

impl Record for Transaction {
    const KIND: &'static str = "transaction";
    const MIN_FIELDS: usize = 12;

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.id,
            self.supplier_id,
            self.retailer_id,
            self.product_id,
            self.transporter_id,
            self.quantity,
            self.product_cost,
            self.transport_cost,
            self.total_cost,
            self.timestamp,
            self.status,
            self.order_type
        )
    }

    fn from_fields(fields: &[&str]) -> RecordResult<Self> {
        let timestamp = Timestamp::parse(fields[9]).ok_or_else(|| {
            RecordError::malformed(Self::KIND, format!("invalid timestamp '{}'", fields[9]))
        })?;

        Ok(Transaction {
            id: record_id(Self::KIND, fields[0])?,
            supplier_id: parse_field(Self::KIND, "supplier id", fields[1])?,
            retailer_id: parse_field(Self::KIND, "retailer id", fields[2])?,
            product_id: parse_field(Self::KIND, "product id", fields[3])?,
            transporter_id: parse_field(Self::KIND, "transporter id", fields[4])?,
            quantity: parse_field(Self::KIND, "quantity", fields[5])?,
            product_cost: non_negative(Self::KIND, "product cost", fields[6])?,
            transport_cost: non_negative(Self::KIND, "transport cost", fields[7])?,
            total_cost: non_negative(Self::KIND, "total cost", fields[8])?,
            timestamp,
            status: parse_field(Self::KIND, "status", fields[10])?,
            order_type: parse_field(Self::KIND, "order type", fields[11])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_product_line() {
        let product = Product::from_line("1|Rice|5.50|1000").unwrap();
        assert_eq!(product.id, ProductId(1));
        assert_eq!(product.price, Decimal::new(550, 2));
        assert_eq!(product.stock, 1000);
        assert_eq!(product.to_line(), "1|Rice|5.50|1000");
    }

    #[test]
    fn test_product_negative_stock_rejected() {
        assert!(Product::from_line("1|Rice|5.50|-3").is_err());
        assert!(Product::from_line("1|Rice|5.50").is_err());
    }

    #[test]
    fn test_product_negative_price_rejected() {
        let err = Product::from_line("1|Rice|-5.50|10").unwrap_err();
        assert!(err.to_string().contains("negative price"));
        assert!(Product::from_line("1|Rice|0|10").is_ok());
    }

    #[test]
    fn test_record_id_range() {
        assert!(Product::from_line("0|Rice|5.50|10").is_err());
        assert!(Product::from_line("4294967295|Rice|5.50|10").is_err());
        assert!(Product::from_line("4294967294|Rice|5.50|10").is_ok());
        assert!(Transporter::from_line("0|FastTrans|Truck|2.50|5000").is_err());
    }

    #[test]
    fn test_supplier_line_keeps_duplicates() {
        let supplier =
            Supplier::from_line("2|Malayan Agro|Kuala Lumpur|HQ|3.168|101.708|1,2,1").unwrap();
        assert_eq!(supplier.product_ids, vec![ProductId(1), ProductId(2), ProductId(1)]);
        assert_eq!(supplier.coordinates.latitude(), 3.168);
        assert_eq!(
            supplier.to_line(),
            "2|Malayan Agro|Kuala Lumpur|HQ|3.168|101.708|1,2,1"
        );
    }

    #[test]
    fn test_supplier_without_product_list() {
        let supplier = Supplier::from_line("2|Malayan Agro|Kuala Lumpur|HQ|3.168|101.708").unwrap();
        assert!(supplier.product_ids.is_empty());
    }

    #[test]
    fn test_supplier_bad_coordinates_rejected() {
        let err = Supplier::from_line("2|Agro|KL|HQ|95.0|101.708|1").unwrap_err();
        assert!(err.to_string().contains("supplier"));
    }

    #[test]
    fn test_retailer_line() {
        let retailer =
            Retailer::from_line("1|FreshMart|Petaling Jaya|3.148|101.698|10000|120000|1,2")
                .unwrap();
        assert_eq!(retailer.credit.current, Decimal::from(10000));
        assert_eq!(retailer.credit.annual, Decimal::from(120000));
        assert_eq!(retailer.product_ids.len(), 2);
    }

    #[test]
    fn test_retailer_negative_current_credit_rejected() {
        assert!(Retailer::from_line("1|FreshMart|PJ|3.148|101.698|-1|120000|").is_err());

        let overdrawn = Retailer::from_line("1|FreshMart|PJ|3.148|101.698|50|-25|").unwrap();
        assert_eq!(overdrawn.credit.annual, Decimal::from(-25));
    }

    #[test]
    fn test_transporter_non_positive_rates_rejected() {
        assert!(Transporter::from_line("1|T|Truck|0|100").is_err());
        assert!(Transporter::from_line("1|T|Truck|-2.50|100").is_err());
        assert!(Transporter::from_line("1|T|Truck|2.50|0").is_err());
        assert!(Transporter::from_line("1|T|Truck|2.50|NaN").is_err());
    }

    #[test]
    fn test_transporter_line() {
        let transporter = Transporter::from_line("1|FastTrans|Truck|2.50|5000").unwrap();
        assert_eq!(transporter.cost_per_km, Decimal::new(250, 2));
        assert_eq!(transporter.max_capacity, 5000.0);
        assert_eq!(transporter.to_line(), "1|FastTrans|Truck|2.50|5000");
    }

    #[test]
    fn test_transaction_line() {
        let line = "3|1|2|1|1|100|550.00|6.2050875|556.2050875|20250314:09:26|Completed|Seasonal";
        let tx = Transaction::from_line(line).unwrap();
        assert_eq!(tx.id, TransactionId(3));
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.order_type, OrderType::Seasonal);
        assert_eq!(tx.total_cost, tx.product_cost + tx.transport_cost);
        assert_eq!(tx.to_line(), line);
    }

    #[test]
    fn test_transaction_negative_cost_rejected() {
        let line = "3|1|2|1|1|100|-550|6|-544|20250314:09:26|Completed|Regular";
        assert!(Transaction::from_line(line).is_err());
    }

    #[test]
    fn test_transaction_unknown_status_rejected() {
        let line = "3|1|2|1|1|100|550|6|556|20250314:09:26|Shipped|Regular";
        assert!(Transaction::from_line(line).is_err());
    }
}
