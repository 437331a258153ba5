//! Race result record: one driver/constructor outcome in a race.
//!
//! # Invariants
//! - `race_id`, `driver_id`, `constructor_id` reference surrogate ids and are
//!   fixed at creation.
//! - `position` is `None` for non-classified finishers; `position_text`
//!   carries the display form (`"1"`, `"R"`, `"D"`...).

use super::lifecycle::RecordId;
use super::patch::{assign, deserialize_nullable_field};
use super::validation::{require_min, require_non_negative, require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub id: RecordId,
    pub race_id: RecordId,
    pub driver_id: RecordId,
    pub constructor_id: RecordId,
    /// Car number.
    pub number: i32,
    /// Starting grid slot; `0` means pit-lane start.
    pub grid: i32,
    pub position: Option<i32>,
    pub position_text: String,
    /// Total ordering key inside one race, classified or not.
    pub position_order: i32,
    pub points: f64,
    pub laps: i32,
    /// Race time for the winner, gap for the others.
    pub time: Option<String>,
    pub milliseconds: Option<i64>,
    /// Lap on which the fastest lap was set.
    pub fastest_lap: Option<i32>,
    pub rank: Option<i32>,
    pub fastest_lap_time: Option<String>,
    pub fastest_lap_speed: Option<f64>,
    /// Finishing status, e.g. `Finished`, `+1 Lap`, `Accident`.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RaceResult {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&Outcome {
            grid: self.grid,
            position: self.position,
            position_text: &self.position_text,
            position_order: self.position_order,
            points: self.points,
            laps: self.laps,
            fastest_lap_speed: self.fastest_lap_speed,
            status: &self.status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRaceResult {
    pub race_id: RecordId,
    pub driver_id: RecordId,
    pub constructor_id: RecordId,
    pub number: i32,
    pub grid: i32,
    #[serde(default)]
    pub position: Option<i32>,
    pub position_text: String,
    pub position_order: i32,
    #[serde(default)]
    pub points: f64,
    pub laps: i32,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub milliseconds: Option<i64>,
    #[serde(default)]
    pub fastest_lap: Option<i32>,
    #[serde(default)]
    pub rank: Option<i32>,
    #[serde(default)]
    pub fastest_lap_time: Option<String>,
    #[serde(default)]
    pub fastest_lap_speed: Option<f64>,
    pub status: String,
}

impl NewRaceResult {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&Outcome {
            grid: self.grid,
            position: self.position,
            position_text: &self.position_text,
            position_order: self.position_order,
            points: self.points,
            laps: self.laps,
            fastest_lap_speed: self.fastest_lap_speed,
            status: &self.status,
        })
    }
}

/// Partial update for a result. Parent references cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceResultPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<i32>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps: Option<i32>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub milliseconds: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub fastest_lap: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub rank: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub fastest_lap_time: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub fastest_lap_speed: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RaceResultPatch {
    pub fn apply_to(&self, result: &mut RaceResult) {
        assign(&mut result.number, &self.number);
        assign(&mut result.grid, &self.grid);
        assign(&mut result.position, &self.position);
        assign(&mut result.position_text, &self.position_text);
        assign(&mut result.position_order, &self.position_order);
        assign(&mut result.points, &self.points);
        assign(&mut result.laps, &self.laps);
        assign(&mut result.time, &self.time);
        assign(&mut result.milliseconds, &self.milliseconds);
        assign(&mut result.fastest_lap, &self.fastest_lap);
        assign(&mut result.rank, &self.rank);
        assign(&mut result.fastest_lap_time, &self.fastest_lap_time);
        assign(&mut result.fastest_lap_speed, &self.fastest_lap_speed);
        assign(&mut result.status, &self.status);
    }
}

struct Outcome<'a> {
    grid: i32,
    position: Option<i32>,
    position_text: &'a str,
    position_order: i32,
    points: f64,
    laps: i32,
    fastest_lap_speed: Option<f64>,
    status: &'a str,
}

fn validate_fields(outcome: &Outcome<'_>) -> Result<(), ValidationError> {
    require_min("grid", i64::from(outcome.grid), 0)?;
    if let Some(position) = outcome.position {
        require_min("position", i64::from(position), 1)?;
    }
    require_text("position_text", outcome.position_text)?;
    require_min("position_order", i64::from(outcome.position_order), 1)?;
    require_non_negative("points", outcome.points)?;
    require_min("laps", i64::from(outcome.laps), 0)?;
    if let Some(speed) = outcome.fastest_lap_speed {
        require_non_negative("fastest_lap_speed", speed)?;
    }
    require_text("status", outcome.status)
}
