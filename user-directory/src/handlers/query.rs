//! Query parameters for the user listing
//!
//! # Example
//!
//! ```rust
//! use user_directory::config::PaginationConfig;
//! use user_directory::handlers::ListQuery;
//!
//! let config = PaginationConfig::default();
//!
//! let everything = ListQuery::default();
//! assert_eq!(everything.window(&config).unwrap(), None);
//!
//! let second = ListQuery::default().with_page(2);
//! let window = second.window(&config).unwrap().unwrap();
//! assert_eq!((window.offset, window.limit), (4, 4));
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    config::PaginationConfig,
    error::{Error, Result},
    repository::Pagination,
};

/// Paging parameters for list operations
///
/// Without `page` the whole collection is returned; `per_page` alone has no
/// effect.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Number of items per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl ListQuery {
    /// Set the page number
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the number of items per page
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Resolve the requested window against the configured page sizes
    ///
    /// `per_page` defaults to `default_page_size` and is capped at
    /// `max_page_size`. Zero for either parameter is a bad request.
    pub fn window(&self, config: &PaginationConfig) -> Result<Option<Pagination>> {
        if self.per_page == Some(0) {
            return Err(Error::BadRequest("per_page must be at least 1".to_string()));
        }

        let Some(page) = self.page else {
            return Ok(None);
        };

        if page == 0 {
            return Err(Error::BadRequest("page numbers start at 1".to_string()));
        }

        let per_page = self
            .per_page
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        Ok(Some(Pagination::page(u64::from(page), u64::from(per_page))))
    }
}
