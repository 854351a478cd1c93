//! Pagination module
//!
//! Offset pagination over a cumulative record count.
//!
//! # Overview
//!
//! The cursor is the number of records fetched so far in a stream run. Each
//! page advances it by the page's record count; an empty page ends the run.
//! `PaginationState` models the FETCHING / DONE state machine.

mod types;

pub use types::{next_page_token, NextPage, OffsetPaginator, PaginationPhase, PaginationState};
