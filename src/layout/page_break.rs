//! # Page Break Decisions
//!
//! Logic for deciding whether a row may take the next free slot of a page.
//! The one rule encoded here keeps a process header from being stranded on
//! the last line of a page with none of its tasks beneath it.

use super::Row;

/// What to do with the next row of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDecision {
    /// Place the row in the next free slot.
    Place,
    /// Fill the slot with a blank row, close the page, and start the next
    /// page with this row.
    DeferToNextPage,
}

/// Decide where `row` goes given how full the current page is.
///
/// A header is deferred only when it would take the final slot, more rows
/// follow it, and the page already holds something. The last condition
/// keeps a one-row page from deferring forever.
pub fn decide_slot(filled: usize, capacity: usize, row: &Row, has_following: bool) -> SlotDecision {
    let last_slot = capacity.saturating_sub(filled) == 1;
    if last_slot && filled > 0 && row.is_header() && has_following {
        SlotDecision::DeferToNextPage
    } else {
        SlotDecision::Place
    }
}
