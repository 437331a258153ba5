//! Serde helper functions for partial-update inputs.
//!
//! A patch field uses `Option<Option<T>>`: an absent key stays `None`, an
//! explicit `null` becomes `Some(None)` and clears the stored value.

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable patch field, keeping a present `null` as
/// `Some(None)`. Pair with `#[serde(default)]` so a missing key stays `None`.
pub fn deserialize_nullable_field<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(Some(value))
}

/// Overwrites `target` only when the patch carries a value.
pub(crate) fn assign<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
