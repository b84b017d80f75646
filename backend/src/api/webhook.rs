//! Payment processor webhook.
//!
//! Every request that reaches the processing stage is answered with 200, even
//! when the user is unknown or the database fails, so the processor never
//! retries. Only a wrong method (405) or a malformed payload (400) is refused,
//! and both are rejected before any database access.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::{AppError, ErrorResponse};
use crate::models::SubscriptionTier;
use crate::AppState;

/// Inbound order notification. Fields are optional so that missing values
/// are reported as validation errors rather than extractor rejections.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default, rename = "Customer")]
    pub customer: Option<WebhookCustomer>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCustomer {
    #[serde(default)]
    pub email: Option<String>,
}

/// A payload that passed validation.
#[derive(Debug, PartialEq, Eq)]
pub struct OrderNotification {
    pub event: OrderEvent,
    pub email: String,
}

/// What an order status means for the customer's subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    Paid,
    Refunded,
    Chargedback,
    Other(String),
}

impl OrderEvent {
    pub fn from_status(status: &str) -> Self {
        let status = status.trim().to_ascii_lowercase();
        match status.as_str() {
            "paid" => OrderEvent::Paid,
            "refunded" => OrderEvent::Refunded,
            "chargedback" => OrderEvent::Chargedback,
            _ => OrderEvent::Other(status),
        }
    }

    /// Tier the subscription moves to, if the event changes it at all.
    pub fn target_tier(&self) -> Option<SubscriptionTier> {
        match self {
            OrderEvent::Paid => Some(SubscriptionTier::Pro),
            OrderEvent::Refunded | OrderEvent::Chargedback => Some(SubscriptionTier::Free),
            OrderEvent::Other(_) => None,
        }
    }
}

/// Outcome reported back to the processor.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    Upgraded,
    Downgraded,
    Ignored,
    UserNotFound,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub action: WebhookAction,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionTier>,
}

/// Validate a raw body into an order notification.
pub fn parse_payload(body: &[u8]) -> Result<OrderNotification, AppError> {
    let payload: WebhookPayload = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON payload: {}", e)))?;

    let status = payload
        .order_status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("order_status is required".to_string()))?;

    let email = payload
        .customer
        .and_then(|c| c.email)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Customer.email is required".to_string()))?;

    Ok(OrderNotification {
        event: OrderEvent::from_status(status),
        email,
    })
}

/// POST /webhooks/payment - Sync subscription tier from an order event.
pub async fn payment_webhook(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        tracing::warn!(%method, "Webhook called with unsupported method");
        let error = AppError::MethodNotAllowed(format!("Method {} not allowed", method));
        return (
            error.status_code(),
            [(header::ALLOW, "POST")],
            Json(ErrorResponse::new(&error, 0)),
        )
            .into_response();
    }

    let notification = match parse_payload(&body) {
        Ok(notification) => notification,
        Err(error) => {
            tracing::warn!(error = %error, "Rejected malformed webhook payload");
            return (error.status_code(), Json(ErrorResponse::new(&error, 0))).into_response();
        }
    };

    match process_notification(&state, &notification).await {
        Ok(outcome) => {
            let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
            ApiResponse::new(outcome, revision_id).into_response()
        }
        Err(error) => {
            // Acknowledge anyway so the processor does not retry.
            tracing::error!(
                error = %error,
                email = %notification.email,
                event = ?notification.event,
                "Webhook processing failed"
            );
            (StatusCode::OK, Json(ErrorResponse::new(&error, 0))).into_response()
        }
    }
}

async fn process_notification(
    state: &AppState,
    notification: &OrderNotification,
) -> Result<WebhookOutcome, AppError> {
    let Some(user_id) = state.repo.find_user_id_by_email(&notification.email).await? else {
        tracing::info!(email = %notification.email, "Webhook for unknown user, nothing to do");
        return Ok(WebhookOutcome {
            action: WebhookAction::UserNotFound,
            message: format!("No user registered with email {}", notification.email),
            user_id: None,
            subscription: None,
        });
    };

    let Some(tier) = notification.event.target_tier() else {
        tracing::info!(user_id = %user_id, event = ?notification.event, "Ignoring order status");
        return Ok(WebhookOutcome {
            action: WebhookAction::Ignored,
            message: "Order status does not affect the subscription".to_string(),
            user_id: Some(user_id),
            subscription: None,
        });
    };

    if !state.repo.set_subscription(&user_id, tier).await? {
        return Err(AppError::Internal(format!(
            "Profile {} disappeared before its subscription could be updated",
            user_id
        )));
    }

    tracing::info!(user_id = %user_id, tier = tier.as_str(), "Subscription updated from webhook");

    let action = match tier {
        SubscriptionTier::Pro => WebhookAction::Upgraded,
        SubscriptionTier::Free => WebhookAction::Downgraded,
    };

    Ok(WebhookOutcome {
        action,
        message: format!("Subscription set to {}", tier.as_str()),
        user_id: Some(user_id),
        subscription: Some(tier),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_payload() {
        let body = br#"{"order_status":"paid","Customer":{"email":" Owner@Shop.com "},"order_id":42}"#;
        let notification = parse_payload(body).unwrap();
        assert_eq!(notification.event, OrderEvent::Paid);
        assert_eq!(notification.email, "Owner@Shop.com");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let cases: [&[u8]; 6] = [
            br#"{"Customer":{"email":"a@b.com"}}"#,
            br#"{"order_status":"  ","Customer":{"email":"a@b.com"}}"#,
            br#"{"order_status":"paid"}"#,
            br#"{"order_status":"paid","Customer":{}}"#,
            br#"{"order_status":"paid","Customer":{"email":""}}"#,
            br#"{"order_status":"paid","customer":{"email":"a@b.com"}}"#,
        ];
        for body in cases {
            let err = parse_payload(body).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_payload(b"order_status=paid").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(parse_payload(b"").is_err());
    }

    #[test]
    fn test_order_events_map_to_tiers() {
        assert_eq!(
            OrderEvent::from_status("paid").target_tier(),
            Some(SubscriptionTier::Pro)
        );
        assert_eq!(
            OrderEvent::from_status("REFUNDED").target_tier(),
            Some(SubscriptionTier::Free)
        );
        assert_eq!(
            OrderEvent::from_status("chargedback").target_tier(),
            Some(SubscriptionTier::Free)
        );
        assert_eq!(OrderEvent::from_status("waiting_payment").target_tier(), None);
    }
}
