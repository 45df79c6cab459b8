//! Errors the engine can return.
//!
//! - [`ValidationError`] for a malformed manual command.
//! - [`StoreError`] when the durable store rejects or fails a call.
//! - [`OcrError`] when an image could not be turned into text.
//!
//! [`EngineError`] wraps all of them for callers that do not care which
//! collaborator failed.
use sea_orm::DbErr;
use thiserror::Error;

/// A manual command that cannot become a draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("too few tokens: expected <verb> <amount> <type> [description]")]
    TooFewTokens,
    #[error("unknown verb \"{0}\"")]
    UnknownVerb(String),
    #[error("invalid amount \"{0}\"")]
    InvalidAmount(String),
}

/// Durable store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("store backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for StoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (Self::Backend(a), Self::Backend(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Text recognition failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    #[error("image is empty")]
    EmptyImage,
    #[error("ocr request failed: {0}")]
    Request(String),
}

/// Engine custom errors.
#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}
