//! Qualifying record: one driver's session outcome for a race.

use super::lifecycle::RecordId;
use super::patch::{assign, deserialize_nullable_field};
use super::validation::{require_min, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifying {
    pub id: RecordId,
    pub race_id: RecordId,
    pub driver_id: RecordId,
    pub constructor_id: RecordId,
    pub number: i32,
    pub position: i32,
    /// Lap times as published, e.g. `1:29.708`.
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Qualifying {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min("position", i64::from(self.position), 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQualifying {
    pub race_id: RecordId,
    pub driver_id: RecordId,
    pub constructor_id: RecordId,
    pub number: i32,
    pub position: i32,
    #[serde(default)]
    pub q1: Option<String>,
    #[serde(default)]
    pub q2: Option<String>,
    #[serde(default)]
    pub q3: Option<String>,
}

impl NewQualifying {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min("position", i64::from(self.position), 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub q1: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub q2: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub q3: Option<Option<String>>,
}

impl QualifyingPatch {
    pub fn apply_to(&self, entry: &mut Qualifying) {
        assign(&mut entry.number, &self.number);
        assign(&mut entry.position, &self.position);
        assign(&mut entry.q1, &self.q1);
        assign(&mut entry.q2, &self.q2);
        assign(&mut entry.q3, &self.q3);
    }
}
