//! Season record: one championship year.
//!
//! # Invariants
//! - `year` is the natural key and is unique across all seasons.
//! - Deleting a season removes its races (and their results/qualifying).

use super::lifecycle::RecordId;
use super::patch::{assign, deserialize_nullable_field};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: RecordId,
    pub year: i32,
    pub wikipedia_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSeason {
    pub year: i32,
    #[serde(default)]
    pub wikipedia_url: Option<String>,
}

impl NewSeason {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            wikipedia_url: None,
        }
    }
}

/// Partial update for a season. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub wikipedia_url: Option<Option<String>>,
}

impl SeasonPatch {
    pub fn apply_to(&self, season: &mut Season) {
        assign(&mut season.year, &self.year);
        assign(&mut season.wikipedia_url, &self.wikipedia_url);
    }
}
