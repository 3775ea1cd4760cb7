//! HTTP response builders with explicit status codes and headers
//!
//! - [`Created`]: 201 with an optional `Location` header
//! - [`NoContent`]: 204 with an empty body
//! - [`Counted`]: 200 with an `X-Total-Count` header

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Header carrying the size of the whole collection behind a listing
pub static X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// HTTP 201 Created response
#[derive(Debug)]
pub struct Created<T> {
    data: T,
    location: Option<String>,
}

impl<T> Created<T> {
    /// Create a new 201 Created response
    pub fn new(data: T) -> Self {
        Self {
            data,
            location: None,
        }
    }

    /// Add a Location header pointing to the created resource
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(&self.data)).into_response();

        if let Some(location) = self.location {
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, value);
            }
        }

        response
    }
}

/// HTTP 204 No Content response
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// HTTP 200 listing with the collection total in `X-Total-Count`
///
/// The total counts the whole collection, not just the items on this page.
#[derive(Debug)]
pub struct Counted<T> {
    items: Vec<T>,
    total: u64,
}

impl<T> Counted<T> {
    /// Wrap a page of items together with the collection total
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

impl<T: Serialize> IntoResponse for Counted<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(&self.items)).into_response();
        response
            .headers_mut()
            .insert(X_TOTAL_COUNT.clone(), HeaderValue::from(self.total));
        response
    }
}
