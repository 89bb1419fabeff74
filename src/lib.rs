// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fasting Tracker: fasting timer, hydration reminders and suggestions
//!
//! This crate provides the backend API for the fasting tracker web client:
//! session timing, reminder notifications, journal/progress storage,
//! personalized fasting suggestions, generated schedules and stress check-ins.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    GeminiClient, HydrationReminder, NotificationDispatcher, PreferenceService, ScheduleGenerator,
    SessionController, StressAdvisor, SuggestionGenerator,
};
use time_utils::SharedClock;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub clock: SharedClock,
    pub sessions: SessionController,
    pub preferences: PreferenceService,
    pub notifications: NotificationDispatcher,
    pub hydration: HydrationReminder,
    pub suggestions: SuggestionGenerator,
    pub schedules: ScheduleGenerator,
    pub stress: StressAdvisor,
}

impl AppState {
    /// Wire up all services around one database handle and clock.
    pub fn new(config: Config, db: FirestoreDb, clock: SharedClock) -> Self {
        let notifications = NotificationDispatcher::new(db.clone(), &config);
        let sessions = SessionController::new(db.clone(), notifications.clone(), clock.clone());
        let preferences = PreferenceService::new(db.clone(), clock.clone());
        let hydration = HydrationReminder::new(db.clone(), notifications.clone(), clock.clone());
        let gemini = GeminiClient::new(&config);
        let suggestions =
            SuggestionGenerator::new(gemini.clone(), config.suggestion_cache_ttl, clock.clone());
        let schedules =
            ScheduleGenerator::new(gemini.clone(), config.suggestion_cache_ttl, clock.clone());
        let stress = StressAdvisor::new(gemini, config.suggestion_cache_ttl, clock.clone());

        Self {
            config,
            db,
            clock,
            sessions,
            preferences,
            notifications,
            hydration,
            suggestions,
            schedules,
            stress,
        }
    }
}
