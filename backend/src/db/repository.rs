//! Database repository: shared plumbing, revision tracking and profiles.
//!
//! Entity-specific operations live in sibling modules as further
//! `impl Repository` blocks.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CreateProfileRequest, Datastore, Profile, RevisionInfo, SubscriptionTier,
    UpdateProfileRequest,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(now())
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Get the full dashboard snapshot.
    pub async fn get_datastore(&self) -> Result<Datastore, AppError> {
        let meta =
            sqlx::query("SELECT schema_version, revision_id, generated_at FROM meta WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(Datastore {
            schema_version: meta.get("schema_version"),
            revision_id: meta.get("revision_id"),
            generated_at: meta.get("generated_at"),
            clients: self.list_clients().await?,
            services: self.list_services().await?,
            products: self.list_products().await?,
            payment_methods: self.list_payment_methods().await?,
            operational_costs: self.list_costs().await?,
            quotes: self.list_quotes().await?,
        })
    }

    // ==================== PROFILE OPERATIONS ====================

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, full_name, subscription, created_at, updated_at FROM profiles ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(profile_from_row).collect())
    }

    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, subscription, created_at, updated_at FROM profiles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Resolve an email address to a profile id.
    ///
    /// Matching ignores surrounding whitespace and ASCII case.
    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT id FROM profiles WHERE email = ? COLLATE NOCASE")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("id")))
    }

    pub async fn create_profile(&self, request: &CreateProfileRequest) -> Result<Profile, AppError> {
        let email = request.email.trim().to_string();

        if self.find_user_id_by_email(&email).await?.is_some() {
            return Err(AppError::Constraint(format!(
                "A profile with email {} already exists",
                email
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = now();

        sqlx::query(
            "INSERT INTO profiles (id, email, full_name, subscription, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(&request.full_name)
        .bind(SubscriptionTier::Free.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Profile {
            id,
            email,
            full_name: request.full_name.clone(),
            subscription: SubscriptionTier::Free,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn update_profile(
        &self,
        id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, AppError> {
        let existing = self
            .get_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))?;

        let full_name = request.full_name.clone().or(existing.full_name);
        let now = now();

        sqlx::query("UPDATE profiles SET full_name = ?, updated_at = ? WHERE id = ?")
            .bind(&full_name)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Profile {
            full_name,
            updated_at: now,
            ..existing
        })
    }

    /// Set the subscription tier of a profile with a single row update.
    ///
    /// Returns `false` when no profile has the given id.
    pub async fn set_subscription(
        &self,
        user_id: &str,
        tier: SubscriptionTier,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE profiles SET subscription = ?, updated_at = ? WHERE id = ?")
            .bind(tier.as_str())
            .bind(now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

pub(super) fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Reject an update whose `expectedVersion` does not match the stored row.
pub(super) fn check_expected_version(
    kind: &str,
    expected: Option<i64>,
    current: i64,
) -> Result<(), AppError> {
    match expected {
        Some(expected) if expected != current => Err(AppError::Conflict {
            message: format!(
                "{} version mismatch: expected {}, current {}",
                kind, expected, current
            ),
            current_version: current,
        }),
        _ => Ok(()),
    }
}

/// Error for a conditional UPDATE that matched no row because the version moved.
pub(super) fn concurrent_modification(current_version: Option<i64>) -> AppError {
    AppError::Conflict {
        message: "Concurrent modification detected".to_string(),
        current_version: current_version.unwrap_or(0),
    }
}

fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> Profile {
    let subscription: String = row.get("subscription");
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        subscription: SubscriptionTier::parse(&subscription).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
