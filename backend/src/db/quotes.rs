//! Quote persistence and line-item resolution against the catalog.

use sqlx::Row;

use super::repository::{check_expected_version, concurrent_modification, now};
use super::Repository;
use crate::errors::AppError;
use crate::models::{
    CreateQuoteRequest, Quote, QuoteItem, QuoteItemInput, QuoteItemKind, QuoteStatus, QuoteTotals,
    UpdateQuoteRequest,
};

const QUOTE_COLUMNS: &str = "id, client_id, items, discount_cents, payment_method_id, status, notes, valid_until, subtotal_cents, applied_discount_cents, total_cents, fee_cents, net_cents, created_at, updated_at, version";

impl Repository {
    pub async fn list_quotes(&self) -> Result<Vec<Quote>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM quotes ORDER BY created_at DESC",
            QUOTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(quote_from_row).collect()
    }

    pub async fn get_quote(&self, id: &str) -> Result<Option<Quote>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM quotes WHERE id = ?", QUOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(quote_from_row).transpose()
    }

    /// Turn submitted lines into priced items, filling catalog lines from the
    /// referenced service or product when description or price is omitted.
    pub async fn resolve_quote_items(
        &self,
        inputs: &[QuoteItemInput],
    ) -> Result<Vec<QuoteItem>, AppError> {
        let mut items = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.iter().enumerate() {
            let line = index + 1;
            if input.quantity <= 0 {
                return Err(AppError::Validation(format!(
                    "Item {}: quantity must be positive",
                    line
                )));
            }
            if input.unit_price_cents.is_some_and(|p| p < 0) {
                return Err(AppError::Validation(format!(
                    "Item {}: unit price must not be negative",
                    line
                )));
            }

            let catalog = match input.kind {
                QuoteItemKind::Custom => None,
                kind => {
                    let reference_id = input.reference_id.as_deref().ok_or_else(|| {
                        AppError::Validation(format!("Item {}: referenceId is required", line))
                    })?;
                    Some(self.catalog_entry(kind, reference_id, line).await?)
                }
            };

            let description = input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .or_else(|| catalog.as_ref().map(|(name, _)| name.clone()))
                .ok_or_else(|| {
                    AppError::Validation(format!("Item {}: description is required", line))
                })?;

            let unit_price_cents = input
                .unit_price_cents
                .or_else(|| catalog.as_ref().map(|(_, price)| *price))
                .ok_or_else(|| {
                    AppError::Validation(format!("Item {}: unitPriceCents is required", line))
                })?;

            items.push(QuoteItem {
                kind: input.kind,
                reference_id: input.reference_id.clone(),
                description,
                quantity: input.quantity,
                unit_price_cents,
            });
        }

        Ok(items)
    }

    async fn catalog_entry(
        &self,
        kind: QuoteItemKind,
        reference_id: &str,
        line: usize,
    ) -> Result<(String, i64), AppError> {
        let entry = match kind {
            QuoteItemKind::Service => self
                .get_service(reference_id)
                .await?
                .map(|s| (s.name, s.price_cents)),
            QuoteItemKind::Product => self
                .get_product(reference_id)
                .await?
                .map(|p| (p.name, p.price_cents)),
            QuoteItemKind::Custom => None,
        };

        entry.ok_or_else(|| {
            AppError::Validation(format!(
                "Item {}: unknown {:?} {}",
                line, kind, reference_id
            ))
        })
    }

    /// Fee percentage of a payment method referenced by a quote.
    async fn quote_fee_percent(&self, payment_method_id: Option<&str>) -> Result<Option<f64>, AppError> {
        let Some(id) = payment_method_id else {
            return Ok(None);
        };
        let method = self
            .get_payment_method(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Payment method {} not found", id)))?;
        Ok(Some(method.fee_percent))
    }

    async fn ensure_client_exists(&self, client_id: &str) -> Result<(), AppError> {
        if self.get_client(client_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Client {} not found",
                client_id
            )));
        }
        Ok(())
    }

    pub async fn create_quote(&self, request: &CreateQuoteRequest) -> Result<Quote, AppError> {
        self.ensure_client_exists(&request.client_id).await?;
        let items = self.resolve_quote_items(&request.items).await?;
        let fee_percent = self
            .quote_fee_percent(request.payment_method_id.as_deref())
            .await?;

        let now = now();
        let quote = Quote {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: request.client_id.clone(),
            totals: QuoteTotals::compute(&items, request.discount_cents, fee_percent),
            items,
            discount_cents: request.discount_cents,
            payment_method_id: request.payment_method_id.clone(),
            status: QuoteStatus::Draft,
            notes: request.notes.clone(),
            valid_until: request.valid_until,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        };

        let items_json = serde_json::to_string(&quote.items)?;

        sqlx::query(
            r#"INSERT INTO quotes (
                id, client_id, items, discount_cents, payment_method_id, status, notes, valid_until,
                subtotal_cents, applied_discount_cents, total_cents, fee_cents, net_cents,
                created_at, updated_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"#,
        )
        .bind(&quote.id)
        .bind(&quote.client_id)
        .bind(&items_json)
        .bind(quote.discount_cents)
        .bind(&quote.payment_method_id)
        .bind(quote.status.as_str())
        .bind(&quote.notes)
        .bind(quote.valid_until)
        .bind(quote.totals.subtotal_cents)
        .bind(quote.totals.discount_cents)
        .bind(quote.totals.total_cents)
        .bind(quote.totals.fee_cents)
        .bind(quote.totals.net_cents)
        .bind(&quote.created_at)
        .bind(&quote.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(quote)
    }

    /// Update a quote, re-pricing it and enforcing status transitions.
    pub async fn update_quote(
        &self,
        id: &str,
        request: &UpdateQuoteRequest,
    ) -> Result<Quote, AppError> {
        let existing = self
            .get_quote(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quote {} not found", id)))?;

        check_expected_version("Quote", request.expected_version, existing.version)?;

        let status = request.status.unwrap_or(existing.status);
        if !existing.status.can_transition_to(status) {
            return Err(AppError::Validation(format!(
                "Quote cannot move from {} to {}",
                existing.status.as_str(),
                status.as_str()
            )));
        }

        let edits_content = request.client_id.is_some() || request.changes_pricing();
        if existing.status.is_terminal() && edits_content {
            return Err(AppError::Validation(format!(
                "Quote is {} and can no longer be edited",
                existing.status.as_str()
            )));
        }

        let client_id = match &request.client_id {
            Some(client_id) => {
                self.ensure_client_exists(client_id).await?;
                client_id.clone()
            }
            None => existing.client_id.clone(),
        };
        let items = match &request.items {
            Some(inputs) => self.resolve_quote_items(inputs).await?,
            None => existing.items.clone(),
        };
        let discount_cents = request.discount_cents.unwrap_or(existing.discount_cents);
        let payment_method_id = match &request.payment_method_id {
            Some(payment_method_id) => payment_method_id.clone(),
            None => existing.payment_method_id.clone(),
        };

        // Status and note changes keep the stored totals, even if the
        // payment method has since been deleted.
        let totals = if request.changes_pricing() {
            let fee_percent = self
                .quote_fee_percent(payment_method_id.as_deref())
                .await?;
            QuoteTotals::compute(&items, discount_cents, fee_percent)
        } else {
            existing.totals
        };

        let updated = Quote {
            id: existing.id.clone(),
            client_id,
            totals,
            items,
            discount_cents,
            payment_method_id,
            status,
            notes: match &request.notes {
                Some(notes) => notes.clone(),
                None => existing.notes.clone(),
            },
            valid_until: request.valid_until.unwrap_or(existing.valid_until),
            created_at: existing.created_at.clone(),
            updated_at: now(),
            version: existing.version + 1,
        };

        let items_json = serde_json::to_string(&updated.items)?;

        let result = sqlx::query(
            r#"UPDATE quotes SET
                client_id = ?, items = ?, discount_cents = ?, payment_method_id = ?, status = ?,
                notes = ?, valid_until = ?, subtotal_cents = ?, applied_discount_cents = ?,
                total_cents = ?, fee_cents = ?, net_cents = ?, updated_at = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&updated.client_id)
        .bind(&items_json)
        .bind(updated.discount_cents)
        .bind(&updated.payment_method_id)
        .bind(updated.status.as_str())
        .bind(&updated.notes)
        .bind(updated.valid_until)
        .bind(updated.totals.subtotal_cents)
        .bind(updated.totals.discount_cents)
        .bind(updated.totals.total_cents)
        .bind(updated.totals.fee_cents)
        .bind(updated.totals.net_cents)
        .bind(&updated.updated_at)
        .bind(updated.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_quote(id).await?;
            return Err(concurrent_modification(current.map(|q| q.version)));
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    pub async fn delete_quote(&self, id: &str) -> Result<(), AppError> {
        self.delete_row("quotes", "Quote", id).await
    }
}

fn quote_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Quote, AppError> {
    let items_json: String = row.get("items");
    let status: String = row.get("status");

    let items: Vec<QuoteItem> = serde_json::from_str(&items_json)
        .map_err(|e| AppError::Internal(format!("Corrupt quote items: {}", e)))?;
    let status = QuoteStatus::parse(&status)
        .ok_or_else(|| AppError::Internal(format!("Unknown quote status '{}'", status)))?;

    Ok(Quote {
        id: row.get("id"),
        client_id: row.get("client_id"),
        items,
        discount_cents: row.get("discount_cents"),
        payment_method_id: row.get("payment_method_id"),
        status,
        notes: row.get("notes"),
        valid_until: row.get("valid_until"),
        totals: QuoteTotals {
            subtotal_cents: row.get("subtotal_cents"),
            discount_cents: row.get("applied_discount_cents"),
            total_cents: row.get("total_cents"),
            fee_cents: row.get("fee_cents"),
            net_cents: row.get("net_cents"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}
