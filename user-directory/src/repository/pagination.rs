//! Pagination parameters for repository queries
//!
//! # Example
//!
//! ```rust
//! use user_directory::repository::Pagination;
//!
//! let page3 = Pagination::page(3, 4);
//! assert_eq!(page3.offset, 8);
//! assert_eq!(page3.limit, 4);
//! ```

/// Pagination parameters for limiting query results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Create pagination for the first page with the given limit
    #[must_use]
    pub const fn first_page(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// Create pagination for a specific page number (1-indexed)
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }

    /// Offset and limit as SQL integers
    ///
    /// SQLite binds signed 64-bit integers; values beyond that range are clamped.
    pub(crate) fn as_sql(&self) -> (i64, i64) {
        let clamp = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
        (clamp(self.offset), clamp(self.limit))
    }
}
