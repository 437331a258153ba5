//! Outcome mapping for external callers.
//!
//! # Responsibility
//! - Translate repository outcomes into HTTP-style status codes.
//! - Provide the JSON envelope printed by the CLI.
//!
//! # Invariants
//! - `Conflict` and `InvalidReference` are client errors (400), validation
//!   failures are 422, anything from storage is 500.

use crate::repo::{RepoError, RepoResult};
use log::{error, warn};
use serde::Serialize;

/// Status attached to every API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiStatus {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    Unprocessable,
    Internal,
}

impl ApiStatus {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Unprocessable => 422,
            Self::Internal => 500,
        }
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.code())
    }
}

/// Maps a repository error to its response status.
pub fn status_for_error(error: &RepoError) -> ApiStatus {
    match error {
        RepoError::NotFound { .. } => ApiStatus::NotFound,
        RepoError::Conflict { .. } | RepoError::InvalidReference { .. } => ApiStatus::BadRequest,
        RepoError::Validation(_) => ApiStatus::Unprocessable,
        RepoError::Db(_)
        | RepoError::UninitializedConnection { .. }
        | RepoError::MissingRequiredTable(_)
        | RepoError::MissingRequiredColumn { .. }
        | RepoError::InvalidData(_) => ApiStatus::Internal,
    }
}

/// JSON envelope: `{ "status": 200, "data": ... }` or
/// `{ "status": 404, "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(status: ApiStatus, data: T) -> Self {
        Self {
            status: status.code(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            status: status.code(),
            data: None,
            error: Some(message.into()),
        }
    }

    /// Wraps a repository result, using `on_success` for the `Ok` case.
    pub fn from_result(result: RepoResult<T>, on_success: ApiStatus) -> Self {
        match result {
            Ok(data) => Self::success(on_success, data),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn from_error(err: &RepoError) -> Self {
        let status = status_for_error(err);
        if status == ApiStatus::Internal {
            error!(
                "event=api_response module=api status=error code={} error={err}",
                status.code()
            );
        } else {
            warn!(
                "event=api_response module=api status=rejected code={} error={err}",
                status.code()
            );
        }
        Self::failure(status, err.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl ApiResponse<()> {
    /// Response for a successful delete.
    pub fn no_content() -> Self {
        Self {
            status: ApiStatus::NoContent.code(),
            data: None,
            error: None,
        }
    }

    /// Wraps a unit result as `204` on success.
    pub fn from_unit(result: RepoResult<()>) -> Self {
        match result {
            Ok(()) => Self::no_content(),
            Err(err) => Self::from_error(&err),
        }
    }
}
