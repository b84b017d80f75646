//! Catalog persistence: services, products and payment methods.

use sqlx::Row;

use super::repository::{check_expected_version, concurrent_modification, now};
use super::Repository;
use crate::errors::AppError;
use crate::models::{
    CreatePaymentMethodRequest, CreateProductRequest, CreateServiceRequest, PaymentMethod,
    Product, Service, UpdatePaymentMethodRequest, UpdateProductRequest, UpdateServiceRequest,
};

impl Repository {
    // ==================== SERVICE OPERATIONS ====================

    pub async fn list_services(&self) -> Result<Vec<Service>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, description, price_cents, duration_minutes, active, updated_at, version FROM services ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(service_from_row).collect())
    }

    pub async fn get_service(&self, id: &str) -> Result<Option<Service>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, description, price_cents, duration_minutes, active, updated_at, version FROM services WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(service_from_row))
    }

    pub async fn create_service(&self, request: &CreateServiceRequest) -> Result<Service, AppError> {
        let service = Service {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            price_cents: request.price_cents,
            duration_minutes: request.duration_minutes,
            active: request.active,
            updated_at: now(),
            version: 1,
        };

        sqlx::query(
            "INSERT INTO services (id, name, description, price_cents, duration_minutes, active, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.active as i32)
        .bind(&service.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(service)
    }

    pub async fn update_service(
        &self,
        id: &str,
        request: &UpdateServiceRequest,
    ) -> Result<Service, AppError> {
        let existing = self
            .get_service(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;

        check_expected_version("Service", request.expected_version, existing.version)?;

        let previous_version = existing.version;
        let updated = Service {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name),
            description: request.description.clone().or(existing.description),
            price_cents: request.price_cents.unwrap_or(existing.price_cents),
            duration_minutes: request.duration_minutes.or(existing.duration_minutes),
            active: request.active.unwrap_or(existing.active),
            updated_at: now(),
            version: previous_version + 1,
            id: existing.id,
        };

        let result = sqlx::query(
            "UPDATE services SET name = ?, description = ?, price_cents = ?, duration_minutes = ?, active = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.price_cents)
        .bind(updated.duration_minutes)
        .bind(updated.active as i32)
        .bind(&updated.updated_at)
        .bind(updated.version)
        .bind(id)
        .bind(previous_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_service(id).await?;
            return Err(concurrent_modification(current.map(|s| s.version)));
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), AppError> {
        self.delete_row("services", "Service", id).await
    }

    // ==================== PRODUCT OPERATIONS ====================

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, sku, price_cents, cost_cents, stock, active, updated_at, version FROM products ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, sku, price_cents, cost_cents, stock, active, updated_at, version FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    pub async fn create_product(&self, request: &CreateProductRequest) -> Result<Product, AppError> {
        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            sku: request.sku.clone(),
            price_cents: request.price_cents,
            cost_cents: request.cost_cents,
            stock: request.stock,
            active: request.active,
            updated_at: now(),
            version: 1,
        };

        sqlx::query(
            "INSERT INTO products (id, name, sku, price_cents, cost_cents, stock, active, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.active as i32)
        .bind(&product.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: &str,
        request: &UpdateProductRequest,
    ) -> Result<Product, AppError> {
        let existing = self
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

        check_expected_version("Product", request.expected_version, existing.version)?;

        let previous_version = existing.version;
        let updated = Product {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name),
            sku: request.sku.clone().or(existing.sku),
            price_cents: request.price_cents.unwrap_or(existing.price_cents),
            cost_cents: request.cost_cents.or(existing.cost_cents),
            stock: request.stock.unwrap_or(existing.stock),
            active: request.active.unwrap_or(existing.active),
            updated_at: now(),
            version: previous_version + 1,
            id: existing.id,
        };

        let result = sqlx::query(
            "UPDATE products SET name = ?, sku = ?, price_cents = ?, cost_cents = ?, stock = ?, active = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&updated.name)
        .bind(&updated.sku)
        .bind(updated.price_cents)
        .bind(updated.cost_cents)
        .bind(updated.stock)
        .bind(updated.active as i32)
        .bind(&updated.updated_at)
        .bind(updated.version)
        .bind(id)
        .bind(previous_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_product(id).await?;
            return Err(concurrent_modification(current.map(|p| p.version)));
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        self.delete_row("products", "Product", id).await
    }

    // ==================== PAYMENT METHOD OPERATIONS ====================

    pub async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, fee_percent, max_installments, active, updated_at, version FROM payment_methods ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(payment_method_from_row).collect())
    }

    pub async fn get_payment_method(&self, id: &str) -> Result<Option<PaymentMethod>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, fee_percent, max_installments, active, updated_at, version FROM payment_methods WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(payment_method_from_row))
    }

    pub async fn create_payment_method(
        &self,
        request: &CreatePaymentMethodRequest,
    ) -> Result<PaymentMethod, AppError> {
        let method = PaymentMethod {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            fee_percent: request.fee_percent,
            max_installments: request.max_installments,
            active: request.active,
            updated_at: now(),
            version: 1,
        };

        sqlx::query(
            "INSERT INTO payment_methods (id, name, fee_percent, max_installments, active, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(method.fee_percent)
        .bind(method.max_installments)
        .bind(method.active as i32)
        .bind(&method.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(method)
    }

    pub async fn update_payment_method(
        &self,
        id: &str,
        request: &UpdatePaymentMethodRequest,
    ) -> Result<PaymentMethod, AppError> {
        let existing = self
            .get_payment_method(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment method {} not found", id)))?;

        check_expected_version("Payment method", request.expected_version, existing.version)?;

        let previous_version = existing.version;
        let updated = PaymentMethod {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name),
            fee_percent: request.fee_percent.unwrap_or(existing.fee_percent),
            max_installments: request.max_installments.unwrap_or(existing.max_installments),
            active: request.active.unwrap_or(existing.active),
            updated_at: now(),
            version: previous_version + 1,
            id: existing.id,
        };

        let result = sqlx::query(
            "UPDATE payment_methods SET name = ?, fee_percent = ?, max_installments = ?, active = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&updated.name)
        .bind(updated.fee_percent)
        .bind(updated.max_installments)
        .bind(updated.active as i32)
        .bind(&updated.updated_at)
        .bind(updated.version)
        .bind(id)
        .bind(previous_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_payment_method(id).await?;
            return Err(concurrent_modification(current.map(|m| m.version)));
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    /// Delete a payment method. Quotes keep their stored totals.
    pub async fn delete_payment_method(&self, id: &str) -> Result<(), AppError> {
        self.delete_row("payment_methods", "Payment method", id).await
    }

    /// Delete one row by id from a fixed table name and bump the revision.
    pub(super) async fn delete_row(
        &self,
        table: &'static str,
        kind: &str,
        id: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", kind, id)));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

fn service_from_row(row: &sqlx::sqlite::SqliteRow) -> Service {
    let active: i32 = row.get("active");
    Service {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price_cents: row.get("price_cents"),
        duration_minutes: row.get("duration_minutes"),
        active: active != 0,
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn product_from_row(row: &sqlx::sqlite::SqliteRow) -> Product {
    let active: i32 = row.get("active");
    Product {
        id: row.get("id"),
        name: row.get("name"),
        sku: row.get("sku"),
        price_cents: row.get("price_cents"),
        cost_cents: row.get("cost_cents"),
        stock: row.get("stock"),
        active: active != 0,
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn payment_method_from_row(row: &sqlx::sqlite::SqliteRow) -> PaymentMethod {
    let active: i32 = row.get("active");
    PaymentMethod {
        id: row.get("id"),
        name: row.get("name"),
        fee_percent: row.get("fee_percent"),
        max_installments: row.get("max_installments"),
        active: active != 0,
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}
