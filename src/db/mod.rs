//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by user_id)
    pub const USERS: &str = "users";
    /// Fasting and reminder preferences (keyed by user_id)
    pub const PREFERENCES: &str = "preferences";
    /// Water intake logs (keyed by user_id)
    pub const HYDRATION: &str = "hydration";

    // Sub-collections under `users/{user_id}`
    pub const FASTING_SESSIONS: &str = "fasting_sessions";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
}
