//! Quote model, line items and price totals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle of a quote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(QuoteStatus::Draft),
            "sent" => Some(QuoteStatus::Sent),
            "approved" => Some(QuoteStatus::Approved),
            "rejected" => Some(QuoteStatus::Rejected),
            _ => None,
        }
    }

    /// Approved and rejected quotes are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuoteStatus::Approved | QuoteStatus::Rejected)
    }

    /// Whether a quote in this status may move to `next`. Staying put is always allowed.
    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            QuoteStatus::Draft => true,
            QuoteStatus::Sent => next != QuoteStatus::Sent,
            QuoteStatus::Approved | QuoteStatus::Rejected => false,
        }
    }
}

/// What a quote line refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteItemKind {
    Service,
    Product,
    Custom,
}

/// A priced line on a quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub kind: QuoteItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl QuoteItem {
    pub fn line_total_cents(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price_cents)
    }
}

/// A line as submitted by the dashboard. Catalog items may omit description and price.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemInput {
    pub kind: QuoteItemKind,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

/// Computed amounts for a quote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    pub subtotal_cents: i64,
    /// Discount actually applied, never more than the subtotal
    pub discount_cents: i64,
    /// Amount charged to the client
    pub total_cents: i64,
    /// Payment processor fee withheld from the shop
    pub fee_cents: i64,
    /// Amount the shop receives
    pub net_cents: i64,
}

impl QuoteTotals {
    pub fn compute(items: &[QuoteItem], discount_cents: i64, fee_percent: Option<f64>) -> Self {
        let subtotal_cents = items
            .iter()
            .fold(0i64, |acc, item| acc.saturating_add(item.line_total_cents()));
        let discount_cents = discount_cents.clamp(0, subtotal_cents);
        let total_cents = subtotal_cents - discount_cents;
        let fee_cents = fee_percent
            .map(|pct| ((total_cents as f64) * pct / 100.0).round() as i64)
            .unwrap_or(0);

        Self {
            subtotal_cents,
            discount_cents,
            total_cents,
            fee_cents,
            net_cents: total_cents - fee_cents,
        }
    }
}

/// A price quote for a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub client_id: String,
    pub items: Vec<QuoteItem>,
    /// Discount as requested; `totals.discount_cents` holds the applied amount
    pub discount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    pub totals: QuoteTotals,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub client_id: String,
    pub items: Vec<QuoteItemInput>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<QuoteItemInput>>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    /// `null` removes the payment method
    #[serde(default, deserialize_with = "super::nullable")]
    pub payment_method_id: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<QuoteStatus>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub valid_until: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl UpdateQuoteRequest {
    /// Whether the request touches anything the totals depend on.
    pub fn changes_pricing(&self) -> bool {
        self.items.is_some() || self.discount_cents.is_some() || self.payment_method_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, unit_price_cents: i64) -> QuoteItem {
        QuoteItem {
            kind: QuoteItemKind::Custom,
            reference_id: None,
            description: "Line".to_string(),
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn test_totals_apply_discount_and_fee() {
        let items = vec![item(2, 15_000), item(1, 4_990)];
        let totals = QuoteTotals::compute(&items, 1_000, Some(3.5));

        assert_eq!(totals.subtotal_cents, 34_990);
        assert_eq!(totals.discount_cents, 1_000);
        assert_eq!(totals.total_cents, 33_990);
        // 33_990 * 3.5% = 1189.65
        assert_eq!(totals.fee_cents, 1_190);
        assert_eq!(totals.net_cents, 32_800);
    }

    #[test]
    fn test_discount_is_clamped_to_subtotal() {
        let totals = QuoteTotals::compute(&[item(1, 500)], 2_000, None);
        assert_eq!(totals.discount_cents, 500);
        assert_eq!(totals.total_cents, 0);
        assert_eq!(totals.fee_cents, 0);
        assert_eq!(totals.net_cents, 0);
    }

    #[test]
    fn test_status_transitions() {
        assert!(QuoteStatus::Draft.can_transition_to(QuoteStatus::Sent));
        assert!(QuoteStatus::Draft.can_transition_to(QuoteStatus::Approved));
        assert!(QuoteStatus::Sent.can_transition_to(QuoteStatus::Draft));
        assert!(QuoteStatus::Sent.can_transition_to(QuoteStatus::Rejected));
        assert!(!QuoteStatus::Approved.can_transition_to(QuoteStatus::Draft));
        assert!(!QuoteStatus::Rejected.can_transition_to(QuoteStatus::Approved));
        assert!(QuoteStatus::Approved.can_transition_to(QuoteStatus::Approved));
        assert!(QuoteStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateQuoteRequest = serde_json::from_str(r#"{"status":"sent"}"#).unwrap();
        assert!(absent.payment_method_id.is_none());
        assert!(absent.notes.is_none());
        assert!(!absent.changes_pricing());

        let cleared: UpdateQuoteRequest =
            serde_json::from_str(r#"{"paymentMethodId":null,"notes":null,"validUntil":null}"#)
                .unwrap();
        assert_eq!(cleared.payment_method_id, Some(None));
        assert_eq!(cleared.notes, Some(None));
        assert_eq!(cleared.valid_until, Some(None));
        assert!(cleared.changes_pricing());

        let set: UpdateQuoteRequest =
            serde_json::from_str(r#"{"validUntil":"2026-11-30"}"#).unwrap();
        assert_eq!(set.valid_until, Some(NaiveDate::from_ymd_opt(2026, 11, 30)));
    }
}
