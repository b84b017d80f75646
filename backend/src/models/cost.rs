//! Operational cost model and its dated occurrences.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How often an operational cost falls due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Once => "once",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "once" => Some(Recurrence::Once),
            "monthly" => Some(Recurrence::Monthly),
            "yearly" => Some(Recurrence::Yearly),
            _ => None,
        }
    }
}

/// A recurring or one-off business expense (rent, utilities, tools).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalCost {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount_cents: i64,
    pub recurrence: Recurrence,
    /// Day of month the cost falls due, clamped to the month length
    pub due_day: u32,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostRequest {
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount_cents: i64,
    pub recurrence: Recurrence,
    pub due_day: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCostRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub due_day: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// One dated occurrence of an operational cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInstance {
    /// `{costId}:{YYYY-MM-DD}`
    pub id: String,
    pub cost_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
}

/// Kind of dashboard notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    ExpenseOverdue,
    ExpenseDueSoon,
    QuoteExpiring,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ExpenseOverdue => "expenseOverdue",
            NotificationKind::ExpenseDueSoon => "expenseDueSoon",
            NotificationKind::QuoteExpiring => "quoteExpiring",
        }
    }
}

/// A derived reminder shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub reference_id: String,
    pub message: String,
    pub due_date: NaiveDate,
}
