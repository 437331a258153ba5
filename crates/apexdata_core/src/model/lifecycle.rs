//! Identifier generation and the authoritative clock.
//!
//! # Invariants
//! - Ids are random 128-bit (v4) UUIDs generated at creation time only.
//! - Repositories stamp `created_at`/`updated_at` from exactly one `Clock`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque surrogate identifier shared by all records.
pub type RecordId = Uuid;

/// Generates the surrogate id for a new record.
pub fn new_record_id() -> RecordId {
    Uuid::new_v4()
}

/// Source of "now" for lifecycle timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::{new_record_id, Clock, SystemClock};

    #[test]
    fn generated_ids_are_random_v4() {
        let first = new_record_id();
        let second = new_record_id();
        assert_ne!(first, second);
        assert_eq!(first.get_version_num(), 4);
    }

    #[test]
    fn system_clock_does_not_go_backwards() {
        let clock = SystemClock;
        let before = clock.now();
        let after = clock.now();
        assert!(after >= before);
    }
}
