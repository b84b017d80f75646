//! Client persistence.

use sqlx::Row;

use super::repository::{check_expected_version, concurrent_modification, now};
use super::Repository;
use crate::errors::AppError;
use crate::models::{Client, CreateClientRequest, UpdateClientRequest};

const CLIENT_COLUMNS: &str = "id, name, phone, email, document, vehicle_model, vehicle_plate, vehicle_year, notes, created_at, updated_at, version";

impl Repository {
    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM clients ORDER BY name COLLATE NOCASE",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(client_from_row).collect())
    }

    pub async fn get_client(&self, id: &str) -> Result<Option<Client>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(client_from_row))
    }

    pub async fn create_client(&self, request: &CreateClientRequest) -> Result<Client, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now();

        sqlx::query(
            "INSERT INTO clients (id, name, phone, email, document, vehicle_model, vehicle_plate, vehicle_year, notes, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&id)
        .bind(request.name.trim())
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.document)
        .bind(&request.vehicle_model)
        .bind(&request.vehicle_plate)
        .bind(request.vehicle_year)
        .bind(&request.notes)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Client {
            id,
            name: request.name.trim().to_string(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            document: request.document.clone(),
            vehicle_model: request.vehicle_model.clone(),
            vehicle_plate: request.vehicle_plate.clone(),
            vehicle_year: request.vehicle_year,
            notes: request.notes.clone(),
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a client with optimistic concurrency control.
    pub async fn update_client(
        &self,
        id: &str,
        request: &UpdateClientRequest,
    ) -> Result<Client, AppError> {
        let existing = self
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;

        check_expected_version("Client", request.expected_version, existing.version)?;

        let updated = Client {
            id: existing.id.clone(),
            name: request
                .name
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or(existing.name),
            phone: request.phone.clone().or(existing.phone),
            email: request.email.clone().or(existing.email),
            document: request.document.clone().or(existing.document),
            vehicle_model: request.vehicle_model.clone().or(existing.vehicle_model),
            vehicle_plate: request.vehicle_plate.clone().or(existing.vehicle_plate),
            vehicle_year: request.vehicle_year.or(existing.vehicle_year),
            notes: request.notes.clone().or(existing.notes),
            created_at: existing.created_at,
            updated_at: now(),
            version: existing.version + 1,
        };

        let result = sqlx::query(
            "UPDATE clients SET name = ?, phone = ?, email = ?, document = ?, vehicle_model = ?, vehicle_plate = ?, vehicle_year = ?, notes = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&updated.name)
        .bind(&updated.phone)
        .bind(&updated.email)
        .bind(&updated.document)
        .bind(&updated.vehicle_model)
        .bind(&updated.vehicle_plate)
        .bind(updated.vehicle_year)
        .bind(&updated.notes)
        .bind(&updated.updated_at)
        .bind(updated.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_client(id).await?;
            return Err(concurrent_modification(current.map(|c| c.version)));
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    /// Delete a client. Clients still referenced by quotes are kept.
    pub async fn delete_client(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // The quote guard lives in the statement so no quote can slip in between.
        let result = sqlx::query(
            "DELETE FROM clients WHERE id = ? AND NOT EXISTS (SELECT 1 FROM quotes WHERE client_id = ?)",
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let quote_count: i64 =
                sqlx::query("SELECT COUNT(*) AS n FROM quotes WHERE client_id = ?")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?
                    .get("n");

            if quote_count > 0 {
                return Err(AppError::Constraint(format!(
                    "Client {} has {} quote(s) and cannot be deleted",
                    id, quote_count
                )));
            }
            return Err(AppError::NotFound(format!("Client {} not found", id)));
        }

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn client_from_row(row: &sqlx::sqlite::SqliteRow) -> Client {
    Client {
        id: row.get("id"),
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        document: row.get("document"),
        vehicle_model: row.get("vehicle_model"),
        vehicle_plate: row.get("vehicle_plate"),
        vehicle_year: row.get("vehicle_year"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}
