//! Domain model for Formula 1 historical records.
//!
//! # Responsibility
//! - Define the six persisted records and their create/patch inputs.
//! - Own lifecycle rules: id generation, timestamps, partial updates.
//!
//! # Invariants
//! - Every record is identified by a generated `RecordId` that never changes.
//! - `created_at` is written once; `updated_at` moves on every mutation.
//! - Timestamps come from a `Clock`, never from caller input.

pub mod constructor;
pub mod driver;
pub mod lifecycle;
mod patch;
pub mod qualifying;
pub mod race;
pub mod result;
pub mod season;
pub mod validation;
