// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Water intake log.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WaterIntake {
    /// Epoch milliseconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub timestamp: i64,
    /// Milliliters; negative for corrections
    pub amount: i64,
}

/// Stored at: `hydration/{user_id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HydrationLog {
    #[serde(default)]
    pub current_intake_ml: i64,
    #[serde(default)]
    pub history: Vec<WaterIntake>,
}

impl HydrationLog {
    /// Record an intake. The running total never drops below zero.
    pub fn record(&mut self, amount: i64, timestamp: i64) {
        self.current_intake_ml = (self.current_intake_ml + amount).max(0);
        self.history.push(WaterIntake { timestamp, amount });
    }
}
