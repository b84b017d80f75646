//! Operational cost persistence and expense payment records.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::Row;

use super::repository::{check_expected_version, concurrent_modification, now};
use super::Repository;
use crate::errors::AppError;
use crate::models::{
    CreateCostRequest, ExpenseInstance, OperationalCost, Recurrence, UpdateCostRequest,
};

const COST_COLUMNS: &str = "id, description, category, amount_cents, recurrence, due_day, start_date, end_date, active, updated_at, version";

impl Repository {
    pub async fn list_costs(&self) -> Result<Vec<OperationalCost>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM operational_costs ORDER BY description COLLATE NOCASE",
            COST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(cost_from_row).collect()
    }

    pub async fn get_cost(&self, id: &str) -> Result<Option<OperationalCost>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM operational_costs WHERE id = ?",
            COST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(cost_from_row).transpose()
    }

    pub async fn create_cost(&self, request: &CreateCostRequest) -> Result<OperationalCost, AppError> {
        let cost = OperationalCost {
            id: uuid::Uuid::new_v4().to_string(),
            description: request.description.trim().to_string(),
            category: request.category.clone(),
            amount_cents: request.amount_cents,
            recurrence: request.recurrence,
            due_day: request.due_day,
            start_date: request.start_date,
            end_date: request.end_date,
            active: request.active,
            updated_at: now(),
            version: 1,
        };

        sqlx::query(
            "INSERT INTO operational_costs (id, description, category, amount_cents, recurrence, due_day, start_date, end_date, active, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&cost.id)
        .bind(&cost.description)
        .bind(&cost.category)
        .bind(cost.amount_cents)
        .bind(cost.recurrence.as_str())
        .bind(cost.due_day as i64)
        .bind(cost.start_date)
        .bind(cost.end_date)
        .bind(cost.active as i32)
        .bind(&cost.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(cost)
    }

    /// Merge an update into the stored cost without writing it.
    pub async fn merge_cost_update(
        &self,
        id: &str,
        request: &UpdateCostRequest,
    ) -> Result<OperationalCost, AppError> {
        let existing = self
            .get_cost(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Operational cost {} not found", id)))?;

        check_expected_version("Operational cost", request.expected_version, existing.version)?;

        Ok(OperationalCost {
            description: request
                .description
                .as_deref()
                .map(|d| d.trim().to_string())
                .unwrap_or(existing.description),
            category: request.category.clone().or(existing.category),
            amount_cents: request.amount_cents.unwrap_or(existing.amount_cents),
            recurrence: request.recurrence.unwrap_or(existing.recurrence),
            due_day: request.due_day.unwrap_or(existing.due_day),
            start_date: request.start_date.unwrap_or(existing.start_date),
            end_date: request.end_date.or(existing.end_date),
            active: request.active.unwrap_or(existing.active),
            ..existing
        })
    }

    /// Persist a cost produced by [`Repository::merge_cost_update`].
    pub async fn save_cost(&self, merged: OperationalCost) -> Result<OperationalCost, AppError> {
        let previous_version = merged.version;
        let updated = OperationalCost {
            updated_at: now(),
            version: previous_version + 1,
            ..merged
        };

        let result = sqlx::query(
            "UPDATE operational_costs SET description = ?, category = ?, amount_cents = ?, recurrence = ?, due_day = ?, start_date = ?, end_date = ?, active = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&updated.description)
        .bind(&updated.category)
        .bind(updated.amount_cents)
        .bind(updated.recurrence.as_str())
        .bind(updated.due_day as i64)
        .bind(updated.start_date)
        .bind(updated.end_date)
        .bind(updated.active as i32)
        .bind(&updated.updated_at)
        .bind(updated.version)
        .bind(&updated.id)
        .bind(previous_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_cost(&updated.id).await?;
            return Err(concurrent_modification(current.map(|c| c.version)));
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    /// Delete a cost together with its payment records.
    pub async fn delete_cost(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM operational_costs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Operational cost {} not found",
                id
            )));
        }

        sqlx::query("DELETE FROM expense_payments WHERE cost_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ==================== EXPENSE PAYMENTS ====================

    /// Payment timestamps keyed by instance id for instances due in `[from, to]`.
    pub async fn expense_payments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, String>, AppError> {
        let rows = sqlx::query(
            "SELECT instance_id, paid_at FROM expense_payments WHERE due_date >= ? AND due_date <= ?",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("instance_id"), row.get("paid_at")))
            .collect())
    }

    /// Record an instance as paid. Paying an already paid instance keeps the
    /// original timestamp and does not bump the revision.
    pub async fn mark_instance_paid(&self, instance: &ExpenseInstance) -> Result<String, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO expense_payments (instance_id, cost_id, due_date, amount_cents, paid_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&instance.id)
        .bind(&instance.cost_id)
        .bind(instance.due_date)
        .bind(instance.amount_cents)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.increment_revision().await?;
        }

        let paid_at: String = sqlx::query("SELECT paid_at FROM expense_payments WHERE instance_id = ?")
            .bind(&instance.id)
            .fetch_one(&self.pool)
            .await?
            .get("paid_at");

        Ok(paid_at)
    }

    /// Remove the payment record of an instance. Returns `false` if it was not paid.
    pub async fn unmark_instance_paid(&self, instance_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM expense_payments WHERE instance_id = ?")
            .bind(instance_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_revision().await?;
        Ok(true)
    }
}

fn cost_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<OperationalCost, AppError> {
    let recurrence: String = row.get("recurrence");
    let due_day: i64 = row.get("due_day");
    let active: i32 = row.get("active");

    let recurrence = Recurrence::parse(&recurrence).ok_or_else(|| {
        AppError::Internal(format!("Unknown recurrence '{}' in database", recurrence))
    })?;

    Ok(OperationalCost {
        id: row.get("id"),
        description: row.get("description"),
        category: row.get("category"),
        amount_cents: row.get("amount_cents"),
        recurrence,
        due_day: due_day.clamp(1, 31) as u32,
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        active: active != 0,
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}
