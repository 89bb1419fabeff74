// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personalized fasting suggestions.
//!
//! Combines generated suggestions (cached per coarse input features) with a
//! fixed rule set. Any failure on the generative path substitutes a static
//! fallback list, which is cached like a real answer.

use crate::error::AppError;
use crate::models::fasting::FastingType;
use crate::models::{ActivityLevel, FastingHistory, Gender, UserProfile};
use crate::services::cache::TtlCache;
use crate::services::gemini::GeminiClient;
use crate::time_utils::SharedClock;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

pub const FALLBACK_SUGGESTIONS: [&str; 5] = [
    "Stay hydrated during your fasting periods.",
    "Break your fast with easily digestible foods.",
    "Listen to your body and adjust your fasting schedule if needed.",
    "Ensure you're getting enough nutrients during your eating windows.",
    "Consider consulting with a healthcare professional about your fasting routine.",
];

const SIXTEEN_EIGHT: &str = "16:8 Intermittent Fasting";
const OMAD: &str = "OMAD (One Meal a Day)";

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("static pattern"));

/// Rule-based suggestions. Pure: same inputs, same ordered output.
pub fn basic_suggestions(
    profile: &UserProfile,
    history: &FastingHistory,
    fasting_type: &FastingType,
) -> Vec<String> {
    let mut suggestions: Vec<&str> = Vec::new();

    if profile.age < 18 || profile.age > 70 {
        suggestions.push(
            "Consult with a healthcare professional before starting or changing your fasting routine.",
        );
    }

    match profile.bmi() {
        Some(bmi) if bmi < 18.5 => suggestions.push(
            "Your BMI indicates you're underweight. Consider focusing on nutrient-dense meals during your eating windows.",
        ),
        Some(bmi) if bmi > 30.0 => suggestions.push(
            "Your BMI indicates obesity. Fasting can be beneficial, but consult with a doctor for a comprehensive weight loss plan.",
        ),
        _ => {}
    }

    if matches!(
        profile.activity_level,
        ActivityLevel::Active | ActivityLevel::VeryActive
    ) {
        suggestions.push(
            "Given your high activity level, ensure you're consuming enough calories and nutrients during your eating windows.",
        );
    }

    if history.completed_fasts < 5 {
        suggestions.push(
            "You're new to fasting. Start with shorter fasting windows and gradually increase as you become more comfortable.",
        );
    } else if history.consistency < 0.7 {
        suggestions.push(
            "Your fasting consistency could be improved. Try setting reminders or finding an accountability partner.",
        );
    }

    let average = history.average_fast_duration;
    if average < 16.0 && fasting_type.name != SIXTEEN_EIGHT {
        suggestions.push(
            "Based on your history, you might benefit from trying the 16:8 Intermittent Fasting method.",
        );
    } else if (16.0..24.0).contains(&average) && fasting_type.name != OMAD {
        suggestions.push(
            "You've been consistently fasting for extended periods. You might be ready to try One Meal A Day (OMAD) fasting.",
        );
    }

    if profile.has_condition("diabetes") {
        suggestions.push(
            "If you have diabetes, it's crucial to monitor your blood sugar levels closely while fasting. Consult with your doctor regularly.",
        );
    }

    if profile.has_condition("hypertension") {
        suggestions.push(
            "For those with hypertension, remember to stay hydrated during fasting periods and monitor your blood pressure regularly.",
        );
    }

    if profile.gender == Gender::Female {
        suggestions.push(
            "Women may need to take a more flexible approach to fasting, especially around their menstrual cycle. Listen to your body and adjust as needed.",
        );
    }

    suggestions.into_iter().map(str::to_string).collect()
}

/// Profile fields shared with the model.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptProfile<'a> {
    age: u32,
    weight: f64,
    height: f64,
    gender: Gender,
    activity_level: ActivityLevel,
    health_conditions: &'a [String],
}

impl<'a> From<&'a UserProfile> for PromptProfile<'a> {
    fn from(profile: &'a UserProfile) -> Self {
        Self {
            age: profile.age,
            weight: profile.weight,
            height: profile.height,
            gender: profile.gender,
            activity_level: profile.activity_level,
            health_conditions: &profile.health_conditions,
        }
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Internal(e.into()))
}

pub fn build_prompt(
    profile: &UserProfile,
    history: &FastingHistory,
    fasting_type: &FastingType,
) -> Result<String, AppError> {
    Ok(format!(
        "Given the following user profile and fasting history, provide 3-5 personalized fasting suggestions:\n\n\
         User Profile:\n{}\n\n\
         Fasting History:\n{}\n\n\
         Current Fasting Type:\n{}\n\n\
         Please provide your response as a simple array of strings, without any additional formatting or markdown.",
        pretty(&PromptProfile::from(profile))?,
        pretty(history)?,
        pretty(fasting_type)?,
    ))
}

/// Deserialize the JSON array embedded in a model reply.
///
/// Spans from the first `[` to the last `]`, so surrounding prose or code
/// fences are ignored.
pub fn extract_json_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, AppError> {
    let array = JSON_ARRAY
        .find(text)
        .ok_or_else(|| AppError::GenerativeApi("No JSON array in response".to_string()))?;

    serde_json::from_str(array.as_str())
        .map_err(|e| AppError::GenerativeApi(format!("Invalid JSON array: {}", e)))
}

/// Extract the JSON string array from a model reply.
pub fn parse_suggestions(text: &str) -> Result<Vec<String>, AppError> {
    extract_json_array(text)
}

pub(crate) fn fallback_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Canonical key over the coarse inputs that shape a generated answer.
pub fn cache_key(
    profile: &UserProfile,
    history: &FastingHistory,
    fasting_type: &FastingType,
) -> String {
    serde_json::json!({
        "age": profile.age,
        "weight": profile.weight,
        "height": profile.height,
        "gender": profile.gender,
        "activityLevel": profile.activity_level,
        "healthConditions": profile.health_conditions,
        "completedFasts": history.completed_fasts,
        "averageFastDuration": history.average_fast_duration,
        "longestFast": history.longest_fast,
        "consistency": history.consistency,
        "fastingTypeName": fasting_type.name,
    })
    .to_string()
}

/// Keep the first occurrence of each suggestion.
pub fn dedupe(suggestions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    suggestions
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

pub struct SuggestionGenerator {
    gemini: GeminiClient,
    cache: TtlCache<Vec<String>>,
    clock: SharedClock,
}

impl SuggestionGenerator {
    pub fn new(gemini: GeminiClient, cache_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            gemini,
            cache: TtlCache::new(cache_ttl),
            clock,
        }
    }

    /// Generated suggestions first, then the rule-based ones, without duplicates.
    pub async fn generate(
        &self,
        profile: &UserProfile,
        history: &FastingHistory,
        fasting_type: &FastingType,
    ) -> Vec<String> {
        let generated = self.generated_suggestions(profile, history, fasting_type).await;
        let basic = basic_suggestions(profile, history, fasting_type);
        dedupe(generated.into_iter().chain(basic))
    }

    async fn generated_suggestions(
        &self,
        profile: &UserProfile,
        history: &FastingHistory,
        fasting_type: &FastingType,
    ) -> Vec<String> {
        let key = cache_key(profile, history, fasting_type);
        let now = self.clock.now();

        if let Some(cached) = self.cache.get(&key, now) {
            tracing::debug!("Suggestion cache hit");
            return cached;
        }

        let suggestions = if !self.gemini.is_configured() {
            tracing::debug!("Gemini not configured, using fallback suggestions");
            fallback_list(&FALLBACK_SUGGESTIONS)
        } else {
            match self.request(profile, history, fasting_type).await {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    tracing::warn!(error = %e, "Suggestion generation failed, using fallback");
                    fallback_list(&FALLBACK_SUGGESTIONS)
                }
            }
        };

        self.cache.insert(key, suggestions.clone(), now);
        suggestions
    }

    async fn request(
        &self,
        profile: &UserProfile,
        history: &FastingHistory,
        fasting_type: &FastingType,
    ) -> Result<Vec<String>, AppError> {
        let prompt = build_prompt(profile, history, fasting_type)?;
        let text = self.gemini.generate_text(&prompt).await?;
        parse_suggestions(&text)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired(self.clock.now())
    }
}
