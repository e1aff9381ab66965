/// Application user identifiers are opaque, time-ordered strings (UUID v7).
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
