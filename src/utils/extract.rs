//! Extractors whose rejections surface as [`AppError`] bodies

use axum::extract::{FromRequest, FromRequestParts};

use crate::utils::errors::AppError;

/// JSON body; malformed input becomes a 400 `VALIDATION_ERROR`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string; unknown enum values and bad numbers become a 400 `VALIDATION_ERROR`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
