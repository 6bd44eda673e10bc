use axum::extract::FromRequest;

use crate::ApiError;

/// `Json` with rejections rendered as the API's `{error}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
