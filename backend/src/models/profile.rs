//! User profile model and subscription tiers.

use serde::{Deserialize, Serialize};

/// Subscription plan gating dashboard features.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Default plan
    #[default]
    Free,
    /// Elevated plan granted by a paid order
    Pro,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionTier::Free),
            "pro" => Some(SubscriptionTier::Pro),
            _ => None,
        }
    }
}

/// A dashboard user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub subscription: SubscriptionTier,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Request body for updating a profile. The subscription is not writable here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SubscriptionTier::Pro).unwrap(),
            "\"pro\""
        );
        assert_eq!(SubscriptionTier::default(), SubscriptionTier::Free);
    }

    #[test]
    fn test_tier_parse_matches_as_str() {
        for tier in [SubscriptionTier::Free, SubscriptionTier::Pro] {
            assert_eq!(SubscriptionTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(SubscriptionTier::parse("enterprise"), None);
    }
}
