//! Pagination types
//!
//! Defines the offset cursor arithmetic and the per-run pagination state.

use std::collections::HashMap;

/// Default query parameter carrying the offset
pub const OFFSET_PARAM: &str = "offset";

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available starting at this offset
    Continue {
        /// Records fetched so far; the next request's offset
        offset: u64,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Convert a next page token into a pagination decision
    pub fn from_token(token: Option<u64>) -> Self {
        match token {
            Some(offset) => Self::Continue { offset },
            None => Self::Done,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Next cursor after a page of `records_count` records
///
/// `None` is terminal. Otherwise the cursor advances by exactly the page size.
pub fn next_page_token(previous: Option<u64>, records_count: usize) -> Option<u64> {
    if records_count == 0 {
        return None;
    }
    Some(previous.unwrap_or(0).saturating_add(records_count as u64))
}

/// Phase of a stream's pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationPhase {
    /// More pages may follow
    #[default]
    Fetching,
    /// An empty page was seen
    Done,
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Cursor for the next request (absent before the first page)
    pub cursor: Option<u64>,
    /// Pages processed so far
    pub pages: u32,
    /// Current phase
    pub phase: PaginationPhase,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Is pagination complete?
    pub fn is_done(&self) -> bool {
        self.phase == PaginationPhase::Done
    }

    /// Records fetched so far
    pub fn total_fetched(&self) -> u64 {
        self.cursor.unwrap_or(0)
    }

    /// Record a processed page and its next token
    pub fn advance(&mut self, next: Option<u64>) -> NextPage {
        self.pages += 1;
        match next {
            Some(offset) => {
                debug_assert!(offset >= self.total_fetched());
                self.cursor = Some(offset);
            }
            None => self.phase = PaginationPhase::Done,
        }
        NextPage::from_token(next)
    }
}

/// Offset paginator: sends the cumulative record count as a query parameter
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter name for offset
    pub offset_param: String,
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new(OFFSET_PARAM)
    }
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(offset_param: impl Into<String>) -> Self {
        Self {
            offset_param: offset_param.into(),
        }
    }

    /// Query parameters for the page after `token`; nothing for the first page
    pub fn page_params(&self, token: Option<u64>) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(offset) = token.filter(|o| *o > 0) {
            params.insert(self.offset_param.clone(), offset.to_string());
        }
        params
    }

    /// Next token after a page of `records_count` records
    pub fn next_token(&self, previous: Option<u64>, records_count: usize) -> Option<u64> {
        next_page_token(previous, records_count)
    }
}
