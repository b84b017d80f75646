//! Catalog models: services, products and payment methods.

use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

fn default_installments() -> i32 {
    1
}

/// A labor service offered by the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    pub active: bool,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// A part or consumable sold by the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price_cents: i64,
    /// Acquisition cost, used for margin display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_cents: Option<i64>,
    pub stock: i64,
    pub active: bool,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// A way the client can pay, with the processor fee the shop absorbs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    pub fee_percent: f64,
    pub max_installments: i32,
    pub active: bool,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethodRequest {
    pub name: String,
    #[serde(default)]
    pub fee_percent: f64,
    #[serde(default = "default_installments")]
    pub max_installments: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentMethodRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fee_percent: Option<f64>,
    #[serde(default)]
    pub max_installments: Option<i32>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}
