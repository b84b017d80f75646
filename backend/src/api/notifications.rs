//! Notification API endpoint.

use axum::extract::{Query, State};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use super::costs::load_instances;
use super::{error, success, ApiResult};
use crate::config::MAX_NOTIFY_WINDOW_DAYS;
use crate::errors::AppError;
use crate::models::Notification;
use crate::schedule;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Look-ahead in days; defaults to the configured window.
    #[serde(default)]
    pub days: Option<i64>,
}

/// Dates scanned for instances: the overdue lookback through the look-ahead window.
fn notification_range(
    today: NaiveDate,
    lookback_days: i64,
    window_days: i64,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let out_of_range = || AppError::Internal("Notification date range out of range".to_string());

    let from = Duration::try_days(lookback_days)
        .and_then(|lookback| today.checked_sub_signed(lookback))
        .ok_or_else(out_of_range)?;
    let to = Duration::try_days(window_days)
        .and_then(|window| today.checked_add_signed(window))
        .ok_or_else(out_of_range)?;
    Ok((from, to))
}

/// GET /api/notifications - Overdue and upcoming expenses, expiring quotes.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let window_days = query.days.unwrap_or(state.config.notify_window_days);
    if !(0..=MAX_NOTIFY_WINDOW_DAYS).contains(&window_days) {
        return error(
            AppError::Validation(format!(
                "days must be between 0 and {}",
                MAX_NOTIFY_WINDOW_DAYS
            )),
            revision_id,
        );
    }

    let today = Utc::now().date_naive();
    let (from, to) = match notification_range(today, state.config.overdue_lookback_days, window_days) {
        Ok(range) => range,
        Err(e) => return error(e, revision_id),
    };

    let instances = match load_instances(&state.repo, from, to).await {
        Ok(instances) => instances,
        Err(e) => return error(e, revision_id),
    };
    let quotes = match state.repo.list_quotes().await {
        Ok(quotes) => quotes,
        Err(e) => return error(e, revision_id),
    };

    let notifications = schedule::build_notifications(&instances, &quotes, today, window_days);
    tracing::debug!(count = notifications.len(), window_days, "Built notifications");

    success(notifications, revision_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_range() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        let (from, to) = notification_range(today, 90, 7).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 12, 10).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 3, 17).unwrap());

        assert!(notification_range(today, 100_000_000, 7).is_err());
    }
}
