//! Delivery route sequencing
//!
//! Greedy nearest-neighbour tour starting and ending at a supplier. The
//! result is a heuristic ordering; it is not guaranteed to be the shortest
//! tour.

use crate::geo::{km_to_decimal, GeoPoint};
use crate::types::{Retailer, RetailerId, Supplier, SupplierId, TransporterId};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;

/// Fewest retailers a route can be planned over
pub const MIN_ROUTE_RETAILERS: usize = 2;

/// Planned visiting order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    /// Start and end of the tour
    pub supplier_id: SupplierId,

    /// Retailers in visiting order, each exactly once
    pub stops: Vec<RetailerId>,

    /// Leg lengths in km: supplier to first stop, stop to stop, last stop
    /// back to supplier
    pub legs_km: Vec<f64>,

    /// Sum of all legs
    pub total_distance_km: f64,
}

impl RoutePlan {
    /// Stops as a `,`-separated id list
    pub fn stop_list(&self) -> String {
        self.stops
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A plan priced for one transporter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCost {
    /// Priced plan
    pub plan: RoutePlan,

    /// Carrier used for pricing
    pub transporter_id: TransporterId,

    /// Total distance times cost per km
    pub transport_cost: Decimal,
}

impl RouteCost {
    /// Ledger record for this route
    pub fn ledger_payload(&self) -> String {
        format!(
            "Optimized Route | Supplier: {} | Retailers: {} | Distance: {:.2} km | Transporter: {} | Cost: RM{:.2}",
            self.plan.supplier_id,
            self.plan.stop_list(),
            self.plan.total_distance_km,
            self.transporter_id,
            self.transport_cost
        )
    }
}

/// Plan a tour from `supplier` through every retailer and back
///
/// Each step moves to the nearest unvisited retailer. On equal distances the
/// retailer earlier in `retailers` wins.
pub fn plan_route(supplier: &Supplier, retailers: &[&Retailer]) -> Result<RoutePlan> {
    if retailers.len() < MIN_ROUTE_RETAILERS {
        return Err(Error::InsufficientRetailers {
            required: MIN_ROUTE_RETAILERS,
            found: retailers.len(),
        });
    }

    let mut visited = vec![false; retailers.len()];
    let mut stops = Vec::with_capacity(retailers.len());
    let mut legs_km = Vec::with_capacity(retailers.len() + 1);
    let mut position: GeoPoint = supplier.coordinates;

    for _ in 0..retailers.len() {
        let mut nearest: Option<(usize, f64)> = None;

        for (index, retailer) in retailers.iter().enumerate() {
            if visited[index] {
                continue;
            }
            let distance = position.distance_km(&retailer.coordinates);
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((index, distance));
            }
        }

        let (index, distance) = nearest
            .ok_or_else(|| Error::Other("route ran out of unvisited retailers".to_string()))?;

        visited[index] = true;
        stops.push(retailers[index].id);
        legs_km.push(distance);
        position = retailers[index].coordinates;
    }

    legs_km.push(position.distance_km(&supplier.coordinates));
    let total_distance_km: f64 = legs_km.iter().sum();

    tracing::info!(
        supplier_id = %supplier.id,
        stops = stops.len(),
        total_distance_km,
        "Route planned"
    );

    Ok(RoutePlan {
        supplier_id: supplier.id,
        stops,
        legs_km,
        total_distance_km,
    })
}

/// Price `plan` at the transporter's rate
pub fn price_route(
    plan: RoutePlan,
    transporter_id: TransporterId,
    cost_per_km: Decimal,
) -> Result<RouteCost> {
    let transport_cost = km_to_decimal(plan.total_distance_km)
        .checked_mul(cost_per_km)
        .ok_or_else(|| {
            Error::CostOverflow(format!("route from supplier {}", plan.supplier_id))
        })?;

    Ok(RouteCost {
        plan,
        transporter_id,
        transport_cost,
    })
}
