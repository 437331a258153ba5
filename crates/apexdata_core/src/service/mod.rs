//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls that span more than one record type.
//! - Keep the API layer decoupled from storage details.

pub mod race_service;
pub mod season_service;
