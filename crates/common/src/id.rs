//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for reports and history entries.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort lexicographically by creation time, so report listings
    /// ordered by ID are also ordered by submission.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a new UUID v7-based ID.
    #[must_use]
    pub fn generate_uuid_v7(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
