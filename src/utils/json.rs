// src/utils/json.rs

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` extractor whose rejections surface as `AppError::BadRequest`
/// with the usual `{"error": ..}` body instead of axum's 415/422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
