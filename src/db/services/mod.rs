//! High-level data access API. Each sub-module covers one domain entity;
//! all public functions are re-exported here so callers can use
//! `crate::db::services::*`.

pub mod event_service;
pub mod profile_service;
pub mod tag_service;
pub mod user_service;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Outcome of a soft-delete that the storage layer may refuse.
///
/// `StillReferenced` carries the case where the engine rejects the
/// deactivation with a referential-constraint error; handlers surface it as
/// a warning instead of a server error.
#[derive(Error, Debug)]
pub enum DeactivateError {
    #[error("record is still referenced")]
    StillReferenced,
    #[error(transparent)]
    Db(#[from] DbErr),
}

pub(crate) fn classify_deactivate_err(err: DbErr) -> DeactivateError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => DeactivateError::StillReferenced,
        _ => DeactivateError::Db(err),
    }
}
