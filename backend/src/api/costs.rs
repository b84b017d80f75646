//! Operational cost and expense instance API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use super::{error, require_non_negative, require_text, success, ApiResult};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CreateCostRequest, ExpenseInstance, OperationalCost, UpdateCostRequest};
use crate::schedule::{self, MAX_RANGE_DAYS};
use crate::AppState;

fn validate_cost(
    description: &str,
    amount_cents: i64,
    due_day: u32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<(), AppError> {
    require_text(description, "description")?;
    require_non_negative(amount_cents, "amountCents")?;
    if !(1..=31).contains(&due_day) {
        return Err(AppError::Validation(
            "dueDay must be between 1 and 31".to_string(),
        ));
    }
    if end_date.is_some_and(|end| end < start_date) {
        return Err(AppError::Validation(
            "endDate must not be before startDate".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/costs - List all operational costs.
pub async fn list_costs(State(state): State<AppState>) -> ApiResult<Vec<OperationalCost>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_costs().await {
        Ok(costs) => success(costs, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/costs/:id - Get a single operational cost.
pub async fn get_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OperationalCost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_cost(&id).await {
        Ok(Some(cost)) => success(cost, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Operational cost {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/costs - Create an operational cost.
pub async fn create_cost(
    State(state): State<AppState>,
    Json(request): Json<CreateCostRequest>,
) -> ApiResult<OperationalCost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_cost(
        &request.description,
        request.amount_cents,
        request.due_day,
        request.start_date,
        request.end_date,
    ) {
        return error(e, revision_id);
    }

    match state.repo.create_cost(&request).await {
        Ok(cost) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(cost, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/costs/:id - Update an operational cost.
pub async fn update_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCostRequest>,
) -> ApiResult<OperationalCost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let merged = match state.repo.merge_cost_update(&id, &request).await {
        Ok(merged) => merged,
        Err(e) => return error(e, revision_id),
    };

    if let Err(e) = validate_cost(
        &merged.description,
        merged.amount_cents,
        merged.due_day,
        merged.start_date,
        merged.end_date,
    ) {
        return error(e, revision_id);
    }

    match state.repo.save_cost(merged).await {
        Ok(cost) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(cost, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/costs/:id - Delete an operational cost and its payment records.
pub async fn delete_cost(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_cost(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Date range for listing instances. Defaults to the current month.
#[derive(Debug, Deserialize)]
pub struct InstanceRangeQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = date
        .with_day(schedule::days_in_month(date.year(), date.month()))
        .unwrap_or(date);
    (first, last)
}

fn resolve_range(query: &InstanceRangeQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (month_start, month_end) = month_bounds(today);
    let from = query.from.unwrap_or(month_start);
    let to = query.to.unwrap_or(month_end);

    if from > to {
        return Err(AppError::Validation(
            "from must not be after to".to_string(),
        ));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "Date range must not exceed {} days",
            MAX_RANGE_DAYS
        )));
    }
    Ok((from, to))
}

/// Generate instances for `[from, to]` and mark the ones already paid.
pub(super) async fn load_instances(
    repo: &Repository,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ExpenseInstance>, AppError> {
    let costs = repo.list_costs().await?;
    let payments = repo.expense_payments_between(from, to).await?;

    let mut instances = schedule::generate_instances(&costs, from, to);
    for instance in &mut instances {
        if let Some(paid_at) = payments.get(&instance.id) {
            instance.paid = true;
            instance.paid_at = Some(paid_at.clone());
        }
    }
    Ok(instances)
}

/// Look up the single occurrence named by an instance id.
async fn resolve_instance(repo: &Repository, instance_id: &str) -> Result<ExpenseInstance, AppError> {
    let not_found = || AppError::NotFound(format!("Expense instance {} not found", instance_id));

    let (cost_id, due_date) = schedule::parse_instance_id(instance_id).ok_or_else(not_found)?;
    let cost = repo.get_cost(cost_id).await?.ok_or_else(not_found)?;

    schedule::generate_instances(std::slice::from_ref(&cost), due_date, due_date)
        .into_iter()
        .find(|instance| instance.id == instance_id)
        .ok_or_else(not_found)
}

/// GET /api/costs/instances - Expense occurrences in a date range.
pub async fn list_expense_instances(
    State(state): State<AppState>,
    Query(query): Query<InstanceRangeQuery>,
) -> ApiResult<Vec<ExpenseInstance>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let (from, to) = match resolve_range(&query, Utc::now().date_naive()) {
        Ok(range) => range,
        Err(e) => return error(e, revision_id),
    };

    match load_instances(&state.repo, from, to).await {
        Ok(instances) => success(instances, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/costs/instances/:instance_id/pay - Mark an occurrence as paid.
pub async fn pay_expense_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> ApiResult<ExpenseInstance> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let mut instance = match resolve_instance(&state.repo, &instance_id).await {
        Ok(instance) => instance,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.mark_instance_paid(&instance).await {
        Ok(paid_at) => {
            instance.paid = true;
            instance.paid_at = Some(paid_at);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(instance, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/costs/instances/:instance_id/pay - Undo a payment.
pub async fn unpay_expense_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> ApiResult<ExpenseInstance> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let instance = match resolve_instance(&state.repo, &instance_id).await {
        Ok(instance) => instance,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.unmark_instance_paid(&instance.id).await {
        Ok(_) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(instance, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_defaults_to_current_month() {
        let query = InstanceRangeQuery {
            from: None,
            to: None,
        };
        let range = resolve_range(&query, date(2028, 2, 14)).unwrap();
        assert_eq!(range, (date(2028, 2, 1), date(2028, 2, 29)));
    }

    #[test]
    fn test_range_rejects_inverted_and_oversized() {
        let inverted = InstanceRangeQuery {
            from: Some(date(2026, 5, 1)),
            to: Some(date(2026, 4, 1)),
        };
        assert!(resolve_range(&inverted, date(2026, 1, 1)).is_err());

        let oversized = InstanceRangeQuery {
            from: Some(date(2026, 1, 1)),
            to: Some(date(2027, 6, 1)),
        };
        assert!(resolve_range(&oversized, date(2026, 1, 1)).is_err());
    }

    #[test]
    fn test_validate_cost() {
        let start = date(2026, 1, 1);
        assert!(validate_cost("Rent", 250_000, 5, start, None).is_ok());
        assert!(validate_cost("Rent", 250_000, 0, start, None).is_err());
        assert!(validate_cost("Rent", 250_000, 32, start, None).is_err());
        assert!(validate_cost("Rent", -1, 5, start, None).is_err());
        assert!(validate_cost("Rent", 1, 5, start, Some(date(2025, 12, 31))).is_err());
    }
}
