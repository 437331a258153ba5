//! Driver record.
//!
//! # Invariants
//! - `driver_id` is the natural key and is unique.
//! - `code` is at most three characters (e.g. `VER`).
//! - A driver referenced by any result or qualifying entry cannot be deleted.

use super::lifecycle::RecordId;
use super::patch::{assign, deserialize_nullable_field};
use super::validation::{require_max_chars, require_min, require_text, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DRIVER_CODE_MAX_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: RecordId,
    /// Natural key, e.g. `max_verstappen`.
    pub driver_id: String,
    pub permanent_number: Option<i32>,
    pub code: Option<String>,
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.driver_id,
            self.permanent_number,
            self.code.as_deref(),
            &self.given_name,
            &self.family_name,
            &self.nationality,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDriver {
    pub driver_id: String,
    #[serde(default)]
    pub permanent_number: Option<i32>,
    #[serde(default)]
    pub code: Option<String>,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewDriver {
    pub fn new(
        driver_id: impl Into<String>,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        nationality: impl Into<String>,
    ) -> Self {
        Self {
            driver_id: driver_id.into(),
            permanent_number: None,
            code: None,
            given_name: given_name.into(),
            family_name: family_name.into(),
            date_of_birth: None,
            nationality: nationality.into(),
            url: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.driver_id,
            self.permanent_number,
            self.code.as_deref(),
            &self.given_name,
            &self.family_name,
            &self.nationality,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub permanent_number: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
}

impl DriverPatch {
    pub fn apply_to(&self, driver: &mut Driver) {
        assign(&mut driver.driver_id, &self.driver_id);
        assign(&mut driver.permanent_number, &self.permanent_number);
        assign(&mut driver.code, &self.code);
        assign(&mut driver.given_name, &self.given_name);
        assign(&mut driver.family_name, &self.family_name);
        assign(&mut driver.date_of_birth, &self.date_of_birth);
        assign(&mut driver.nationality, &self.nationality);
        assign(&mut driver.url, &self.url);
    }
}

fn validate_fields(
    driver_id: &str,
    permanent_number: Option<i32>,
    code: Option<&str>,
    given_name: &str,
    family_name: &str,
    nationality: &str,
) -> Result<(), ValidationError> {
    require_text("driver_id", driver_id)?;
    require_text("given_name", given_name)?;
    require_text("family_name", family_name)?;
    require_text("nationality", nationality)?;
    if let Some(number) = permanent_number {
        require_min("permanent_number", i64::from(number), 0)?;
    }
    if let Some(code) = code {
        require_max_chars("code", code, DRIVER_CODE_MAX_CHARS)?;
    }
    Ok(())
}
