//! Shop client model.

use serde::{Deserialize, Serialize};

/// A customer of the shop together with the vehicle being serviced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Tax or identity document number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    #[serde(default)]
    pub vehicle_year: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for updating a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    #[serde(default)]
    pub vehicle_year: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
