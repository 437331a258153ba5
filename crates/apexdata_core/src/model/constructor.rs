//! Constructor record: a team entered in races.

use super::lifecycle::RecordId;
use super::patch::{assign, deserialize_nullable_field};
use super::validation::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub id: RecordId,
    /// Natural key, e.g. `red_bull`.
    pub constructor_id: String,
    pub name: String,
    pub nationality: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Constructor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.constructor_id, &self.name, &self.nationality)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConstructor {
    pub constructor_id: String,
    pub name: String,
    pub nationality: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewConstructor {
    pub fn new(
        constructor_id: impl Into<String>,
        name: impl Into<String>,
        nationality: impl Into<String>,
    ) -> Self {
        Self {
            constructor_id: constructor_id.into(),
            name: name.into(),
            nationality: nationality.into(),
            url: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.constructor_id, &self.name, &self.nationality)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
}

impl ConstructorPatch {
    pub fn apply_to(&self, constructor: &mut Constructor) {
        assign(&mut constructor.constructor_id, &self.constructor_id);
        assign(&mut constructor.name, &self.name);
        assign(&mut constructor.nationality, &self.nationality);
        assign(&mut constructor.url, &self.url);
    }
}

fn validate_fields(
    constructor_id: &str,
    name: &str,
    nationality: &str,
) -> Result<(), ValidationError> {
    require_text("constructor_id", constructor_id)?;
    require_text("name", name)?;
    require_text("nationality", nationality)
}
