// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use crate::models::stress::StressProfile;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    #[serde(rename = "very active")]
    VeryActive,
}

/// User profile stored in Firestore.
///
/// Stored at: `users/{user_id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Email address (may be None if not shared)
    #[serde(default)]
    pub email: Option<String>,
    /// Age in years
    #[serde(default)]
    pub age: u32,
    /// Weight in kg
    #[serde(default)]
    pub weight: f64,
    /// Height in cm
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    /// Free-form conditions such as "diabetes" or "hypertension"
    #[serde(default)]
    pub health_conditions: Vec<String>,
    /// Last update timestamp (ISO 8601)
    #[serde(default)]
    pub updated_at: String,
    /// Most recent generated schedule
    #[serde(default)]
    pub optimized_schedule: Option<String>,
    /// Stress check-ins, oldest first
    #[serde(default)]
    pub stress_profiles: Vec<StressProfile>,
}

impl UserProfile {
    /// Body-mass index, or None when height is unknown.
    pub fn bmi(&self) -> Option<f64> {
        if self.height <= 0.0 {
            return None;
        }
        let meters = self.height / 100.0;
        Some(self.weight / (meters * meters))
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.health_conditions
            .iter()
            .any(|c| c.eq_ignore_ascii_case(condition))
    }

    /// Merge the present fields of `update`.
    pub fn merge(&mut self, update: ProfileUpdate, now: &str) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(weight) = update.weight {
            self.weight = weight;
        }
        if let Some(height) = update.height {
            self.height = height;
        }
        if let Some(gender) = update.gender {
            self.gender = gender;
        }
        if let Some(level) = update.activity_level {
            self.activity_level = level;
        }
        if let Some(conditions) = update.health_conditions {
            self.health_conditions = conditions;
        }
        self.updated_at = now.to_string();
    }
}

/// Profile edit request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(max = 130))]
    pub age: Option<u32>,
    #[validate(range(min = 0.0, max = 700.0))]
    pub weight: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub height: Option<f64>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub health_conditions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        let profile = UserProfile {
            weight: 81.0,
            height: 180.0,
            ..Default::default()
        };
        let bmi = profile.bmi().unwrap();
        assert!((bmi - 25.0).abs() < 1e-9);

        assert_eq!(UserProfile::default().bmi(), None);
    }

    #[test]
    fn test_activity_level_wire_names() {
        let level: ActivityLevel = serde_json::from_str(r#""very active""#).unwrap();
        assert_eq!(level, ActivityLevel::VeryActive);
        assert_eq!(
            serde_json::to_string(&ActivityLevel::Moderate).unwrap(),
            r#""moderate""#
        );
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let mut profile = UserProfile {
            name: Some("Sam".to_string()),
            age: 30,
            health_conditions: vec!["hypertension".to_string()],
            ..Default::default()
        };

        profile.merge(
            ProfileUpdate {
                age: Some(31),
                ..Default::default()
            },
            "2025-02-01T00:00:00Z",
        );

        assert_eq!(profile.name.as_deref(), Some("Sam"));
        assert_eq!(profile.age, 31);
        assert!(profile.has_condition("Hypertension"));
        assert_eq!(profile.updated_at, "2025-02-01T00:00:00Z");
    }

    #[test]
    fn test_update_rejects_negative_weight() {
        let update = ProfileUpdate {
            weight: Some(-1.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(ProfileUpdate::default().validate().is_ok());
    }
}
