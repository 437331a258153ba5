//! Race record: one Grand Prix within a season.
//!
//! # Invariants
//! - `season_id` always points at an existing season and is fixed at creation.
//! - Races are addressed by their surrogate `id`; there is no natural key.

use super::lifecycle::RecordId;
use super::patch::{assign, deserialize_nullable_field};
use super::validation::{require_min, require_text, ValidationError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RecordId,
    pub season_id: RecordId,
    pub round: i32,
    pub race_name: String,
    pub circuit_id: String,
    pub circuit_name: String,
    pub locality: String,
    pub country: String,
    pub date: NaiveDate,
    /// Scheduled start time (UTC) when known.
    pub time: Option<NaiveTime>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Race {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            self.round,
            &self.race_name,
            &self.circuit_id,
            &self.circuit_name,
            &self.locality,
            &self.country,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRace {
    pub season_id: RecordId,
    pub round: i32,
    pub race_name: String,
    pub circuit_id: String,
    pub circuit_name: String,
    pub locality: String,
    pub country: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewRace {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            self.round,
            &self.race_name,
            &self.circuit_id,
            &self.circuit_name,
            &self.locality,
            &self.country,
        )
    }
}

/// Partial update for a race. The owning season cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RacePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<Option<NaiveTime>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
}

impl RacePatch {
    pub fn apply_to(&self, race: &mut Race) {
        assign(&mut race.round, &self.round);
        assign(&mut race.race_name, &self.race_name);
        assign(&mut race.circuit_id, &self.circuit_id);
        assign(&mut race.circuit_name, &self.circuit_name);
        assign(&mut race.locality, &self.locality);
        assign(&mut race.country, &self.country);
        assign(&mut race.date, &self.date);
        assign(&mut race.time, &self.time);
        assign(&mut race.url, &self.url);
    }
}

fn validate_fields(
    round: i32,
    race_name: &str,
    circuit_id: &str,
    circuit_name: &str,
    locality: &str,
    country: &str,
) -> Result<(), ValidationError> {
    require_min("round", i64::from(round), 1)?;
    require_text("race_name", race_name)?;
    require_text("circuit_id", circuit_id)?;
    require_text("circuit_name", circuit_name)?;
    require_text("locality", locality)?;
    require_text("country", country)
}
