//! Catalog API endpoints: services, products and payment methods.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, require_non_negative, require_text, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CreatePaymentMethodRequest, CreateProductRequest, CreateServiceRequest, PaymentMethod,
    Product, Service, UpdatePaymentMethodRequest, UpdateProductRequest, UpdateServiceRequest,
};
use crate::AppState;

fn validate_service(
    name: Option<&str>,
    price_cents: Option<i64>,
    duration_minutes: Option<i32>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        require_text(name, "name")?;
    }
    if let Some(price) = price_cents {
        require_non_negative(price, "priceCents")?;
    }
    if let Some(minutes) = duration_minutes {
        require_non_negative(minutes.into(), "durationMinutes")?;
    }
    Ok(())
}

fn validate_product(
    name: Option<&str>,
    price_cents: Option<i64>,
    cost_cents: Option<i64>,
    stock: Option<i64>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        require_text(name, "name")?;
    }
    if let Some(price) = price_cents {
        require_non_negative(price, "priceCents")?;
    }
    if let Some(cost) = cost_cents {
        require_non_negative(cost, "costCents")?;
    }
    if let Some(stock) = stock {
        require_non_negative(stock, "stock")?;
    }
    Ok(())
}

fn validate_payment_method(
    name: Option<&str>,
    fee_percent: Option<f64>,
    max_installments: Option<i32>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        require_text(name, "name")?;
    }
    if let Some(fee) = fee_percent {
        if !(0.0..=100.0).contains(&fee) {
            return Err(AppError::Validation(
                "feePercent must be between 0 and 100".to_string(),
            ));
        }
    }
    if let Some(installments) = max_installments {
        if installments < 1 {
            return Err(AppError::Validation(
                "maxInstallments must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

// ==================== SERVICES ====================

/// GET /api/services - List all services.
pub async fn list_services(State(state): State<AppState>) -> ApiResult<Vec<Service>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_services().await {
        Ok(services) => success(services, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/services/:id - Get a single service.
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Service> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_service(&id).await {
        Ok(Some(service)) => success(service, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Service {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/services - Create a service.
pub async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> ApiResult<Service> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_service(
        Some(&request.name),
        Some(request.price_cents),
        request.duration_minutes,
    ) {
        return error(e, revision_id);
    }

    match state.repo.create_service(&request).await {
        Ok(service) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(service, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/services/:id - Update a service.
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateServiceRequest>,
) -> ApiResult<Service> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_service(
        request.name.as_deref(),
        request.price_cents,
        request.duration_minutes,
    ) {
        return error(e, revision_id);
    }

    match state.repo.update_service(&id, &request).await {
        Ok(service) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(service, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/services/:id - Delete a service.
pub async fn delete_service(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_service(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

// ==================== PRODUCTS ====================

/// GET /api/products - List all products.
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_products().await {
        Ok(products) => success(products, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/products/:id - Get a single product.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_product(&id).await {
        Ok(Some(product)) => success(product, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Product {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/products - Create a product.
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<Product> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_product(
        Some(&request.name),
        Some(request.price_cents),
        request.cost_cents,
        Some(request.stock),
    ) {
        return error(e, revision_id);
    }

    match state.repo.create_product(&request).await {
        Ok(product) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(product, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/products/:id - Update a product.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<Product> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_product(
        request.name.as_deref(),
        request.price_cents,
        request.cost_cents,
        request.stock,
    ) {
        return error(e, revision_id);
    }

    match state.repo.update_product(&id, &request).await {
        Ok(product) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(product, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/products/:id - Delete a product.
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_product(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

// ==================== PAYMENT METHODS ====================

/// GET /api/payment-methods - List all payment methods.
pub async fn list_payment_methods(State(state): State<AppState>) -> ApiResult<Vec<PaymentMethod>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_payment_methods().await {
        Ok(methods) => success(methods, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/payment-methods/:id - Get a single payment method.
pub async fn get_payment_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PaymentMethod> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_payment_method(&id).await {
        Ok(Some(method)) => success(method, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Payment method {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/payment-methods - Create a payment method.
pub async fn create_payment_method(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentMethodRequest>,
) -> ApiResult<PaymentMethod> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_payment_method(
        Some(&request.name),
        Some(request.fee_percent),
        Some(request.max_installments),
    ) {
        return error(e, revision_id);
    }

    match state.repo.create_payment_method(&request).await {
        Ok(method) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(method, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/payment-methods/:id - Update a payment method.
pub async fn update_payment_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePaymentMethodRequest>,
) -> ApiResult<PaymentMethod> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_payment_method(
        request.name.as_deref(),
        request.fee_percent,
        request.max_installments,
    ) {
        return error(e, revision_id);
    }

    match state.repo.update_payment_method(&id, &request).await {
        Ok(method) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(method, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/payment-methods/:id - Delete a payment method.
pub async fn delete_payment_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_payment_method(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_payment_method_bounds() {
        assert!(validate_payment_method(Some("Card"), Some(4.99), Some(12)).is_ok());
        assert!(validate_payment_method(None, Some(100.5), None).is_err());
        assert!(validate_payment_method(None, Some(-0.1), None).is_err());
        assert!(validate_payment_method(None, None, Some(0)).is_err());
        assert!(validate_payment_method(Some(" "), None, None).is_err());
    }

    #[test]
    fn test_validate_product_rejects_negative_stock() {
        assert!(validate_product(Some("Oil filter"), Some(2_500), Some(1_200), Some(10)).is_ok());
        let err = validate_product(None, None, None, Some(-1)).unwrap_err();
        assert_eq!(err.message(), "stock must not be negative");
    }
}
