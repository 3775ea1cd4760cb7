//! Extractors whose rejections render as the crate's JSON error body

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// JSON request body; syntax errors are 400, shape errors are 422
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Path parameters; an unparsable id is 404
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParam<T>(pub T);

/// Query string parameters; a malformed query is 400
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);
