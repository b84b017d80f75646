//! Data models for the AutoQuote dashboard and webhook.
//!
//! Field names serialize as camelCase to match the dashboard client. Money is
//! always integer cents.

mod catalog;
mod client;
mod cost;
mod datastore;
mod profile;
mod quote;

pub use catalog::*;
pub use client::*;
pub use cost::*;
pub use datastore::*;
pub use profile::*;
pub use quote::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a clearable field: absent stays `None` (via `serde(default)`),
/// explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
