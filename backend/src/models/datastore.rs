//! Snapshot of all dashboard data.

use serde::{Deserialize, Serialize};

use super::{Client, OperationalCost, PaymentMethod, Product, Quote, Service};

/// The root datastore containing all dashboard data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub schema_version: i32,
    pub generated_at: String,
    pub revision_id: i64,
    pub clients: Vec<Client>,
    pub services: Vec<Service>,
    pub products: Vec<Product>,
    pub payment_methods: Vec<PaymentMethod>,
    pub operational_costs: Vec<OperationalCost>,
    pub quotes: Vec<Quote>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
