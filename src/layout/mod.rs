//! # Row Layout Engine
//!
//! The repair confirmation is a fixed-format table: every page shows the
//! same number of body rows, so a printed stack of pages lines up. Laying
//! out the document is therefore a row-counting problem, not a
//! height-measuring one:
//!
//! 1. Flatten processes into a row stream: one header row per process
//!    followed by its task rows.
//! 2. Walk the stream filling pages of `rows_per_page` slots. A header that
//!    would land in the last slot of a page while more rows follow is
//!    pushed to the next page and a blank row takes its slot (see
//!    [`page_break`]).
//! 3. Pad every page with blank rows up to exactly `rows_per_page`.
//!
//! The page sequence is unbounded: rows are never dropped, however many
//! processes the document holds. Totals are computed separately from the
//! input processes (see [`crate::totals`]), so they never depend on
//! where the page breaks fell.

pub mod page_break;

use log::debug;

use crate::error::{RepairDocError, Result};
use crate::model::{Process, RepairDocument, Task};
use crate::totals::TotalsSummary;
use page_break::{decide_slot, SlotDecision};

/// Body rows per page used when the configuration does not say otherwise.
pub const DEFAULT_ROWS_PER_PAGE: usize = 15;

/// One visual row of the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Group header introducing a process.
    ProcessHeader {
        process_name: String,
        end_date: String,
    },
    /// A task line item.
    Task(Task),
    /// Padding.
    Blank,
}

impl Row {
    pub fn is_header(&self) -> bool {
        matches!(self, Row::ProcessHeader { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Row::Blank)
    }
}

/// A content page: exactly `rows_per_page` rows, padding included.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Zero-based position in the document.
    pub index: usize,
    pub rows: Vec<Row>,
}

impl Page {
    /// Number of rows that are not padding.
    pub fn content_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_blank()).count()
    }
}

/// Result of laying out a whole document.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub pages: Vec<Page>,
    pub totals: TotalsSummary,
    pub rows_per_page: usize,
}

/// Emit one header row per process followed by its tasks, in input order.
pub fn flatten(processes: &[Process]) -> Vec<Row> {
    let task_count: usize = processes.iter().map(|p| p.tasks.len()).sum();
    let mut rows = Vec::with_capacity(processes.len() + task_count);
    for process in processes {
        rows.push(Row::ProcessHeader {
            process_name: process.process_name.clone(),
            end_date: process.end_date.clone(),
        });
        rows.extend(process.tasks.iter().cloned().map(Row::Task));
    }
    rows
}

/// Splits row streams into fixed-capacity pages.
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine {
    rows_per_page: usize,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl LayoutEngine {
    /// Create an engine with the given page capacity. Zero is rejected.
    pub fn new(rows_per_page: usize) -> Result<Self> {
        if rows_per_page == 0 {
            return Err(RepairDocError::Config(
                "rowsPerPage must be at least 1".to_string(),
            ));
        }
        Ok(Self { rows_per_page })
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Assign rows to page segments, before padding.
    ///
    /// Every returned segment holds at most `rows_per_page` rows and at
    /// least one non-blank row. An empty stream yields no segments.
    pub fn assign_segments(&self, rows: Vec<Row>) -> Vec<Vec<Row>> {
        let capacity = self.rows_per_page;
        let mut segments = Vec::new();
        let mut current: Vec<Row> = Vec::with_capacity(capacity);
        let mut stream = rows.into_iter().peekable();

        while let Some(row) = stream.next() {
            let has_following = stream.peek().is_some();
            match decide_slot(current.len(), capacity, &row, has_following) {
                SlotDecision::Place => current.push(row),
                SlotDecision::DeferToNextPage => {
                    current.push(Row::Blank);
                    segments.push(std::mem::replace(
                        &mut current,
                        Vec::with_capacity(capacity),
                    ));
                    current.push(row);
                }
            }
            if current.len() == capacity {
                segments.push(std::mem::replace(
                    &mut current,
                    Vec::with_capacity(capacity),
                ));
            }
        }

        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Flatten, assign and pad. Always returns at least one page.
    pub fn layout(&self, processes: &[Process]) -> Vec<Page> {
        let rows = flatten(processes);
        let row_count = rows.len();
        let mut segments = self.assign_segments(rows);

        // An empty document still gets one (blank) table page
        if segments.is_empty() {
            segments.push(Vec::new());
        }

        let pages: Vec<Page> = segments
            .into_iter()
            .enumerate()
            .map(|(index, mut rows)| {
                rows.resize(self.rows_per_page, Row::Blank);
                Page { index, rows }
            })
            .collect();

        debug!(
            "laid out {} rows into {} page(s) of {}",
            row_count,
            pages.len(),
            self.rows_per_page
        );
        pages
    }

    /// Lay out a document and compute its totals.
    pub fn layout_document(&self, document: &RepairDocument) -> DocumentLayout {
        DocumentLayout {
            pages: self.layout(&document.processes),
            totals: TotalsSummary::from_processes(&document.processes),
            rows_per_page: self.rows_per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(code: &str) -> Task {
        Task {
            code: code.to_string(),
            ..Default::default()
        }
    }

    fn process(name: &str, tasks: usize) -> Process {
        Process::new(
            name,
            "2024-06-30",
            (0..tasks).map(|i| task(&format!("{name}-{i}"))).collect(),
        )
    }

    fn header_name(row: &Row) -> Option<&str> {
        match row {
            Row::ProcessHeader { process_name, .. } => Some(process_name),
            _ => None,
        }
    }

    #[test]
    fn flatten_preserves_order_and_count() {
        let processes = vec![process("A", 2), process("B", 0), process("C", 3)];
        let rows = flatten(&processes);
        assert_eq!(rows.len(), 3 + 5);
        assert_eq!(header_name(&rows[0]), Some("A"));
        assert_eq!(rows[1], Row::Task(task("A-0")));
        assert_eq!(rows[2], Row::Task(task("A-1")));
        assert_eq!(header_name(&rows[3]), Some("B"));
        assert_eq!(header_name(&rows[4]), Some("C"));
        assert_eq!(rows[7], Row::Task(task("C-2")));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            LayoutEngine::new(0),
            Err(RepairDocError::Config(_))
        ));
    }

    #[test]
    fn small_document_fits_one_padded_page() {
        let engine = LayoutEngine::default();
        let pages = engine.layout(&[process("A", 3)]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].rows.len(), 15);
        assert_eq!(pages[0].content_rows(), 4);
        assert!(pages[0].rows[4..].iter().all(Row::is_blank));
    }

    #[test]
    fn empty_document_yields_one_blank_page() {
        let pages = LayoutEngine::default().layout(&[]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content_rows(), 0);
        assert_eq!(pages[0].rows.len(), DEFAULT_ROWS_PER_PAGE);
    }

    #[test]
    fn exact_fill_does_not_add_an_empty_page() {
        // 1 header + 14 tasks = exactly 15 rows
        let pages = LayoutEngine::default().layout(&[process("A", 14)]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content_rows(), 15);
    }

    #[test]
    fn orphan_header_moves_to_next_page() {
        // A: header + 13 tasks = 14 rows, so B's header would take slot 15
        let pages = LayoutEngine::default().layout(&[process("A", 13), process("B", 2)]);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].rows[14], Row::Blank);
        assert_eq!(header_name(&pages[1].rows[0]), Some("B"));
        assert_eq!(pages[1].content_rows(), 3);
    }

    #[test]
    fn orphan_rule_applies_at_every_boundary() {
        let engine = LayoutEngine::new(5).unwrap();
        // Page 1: A + 3 tasks (4 rows), B would be 5th → deferred.
        // Page 2: B + 3 tasks, C would be 5th → deferred.
        let pages = engine.layout(&[process("A", 3), process("B", 3), process("C", 1)]);
        assert_eq!(pages.len(), 3);
        for page in &pages[..2] {
            assert_eq!(page.rows[4], Row::Blank);
        }
        assert_eq!(header_name(&pages[1].rows[0]), Some("B"));
        assert_eq!(header_name(&pages[2].rows[0]), Some("C"));
        for page in &pages {
            assert!(!page.rows.last().map(Row::is_header).unwrap_or(false));
        }
    }

    #[test]
    fn final_header_may_take_last_slot() {
        // Header with no tasks at the very end has nothing to be separated from
        let pages = LayoutEngine::default().layout(&[process("A", 13), process("B", 0)]);
        assert_eq!(pages.len(), 1);
        assert_eq!(header_name(&pages[0].rows[14]), Some("B"));
    }

    #[test]
    fn every_page_has_exact_capacity() {
        let engine = LayoutEngine::new(7).unwrap();
        let processes: Vec<Process> = (0..9).map(|i| process(&format!("P{i}"), i)).collect();
        let pages = engine.layout(&processes);
        assert!(pages.iter().all(|p| p.rows.len() == 7));
        assert!(pages.iter().all(|p| p.content_rows() > 0));
        let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, (0..pages.len()).collect::<Vec<_>>());
    }

    #[test]
    fn forty_rows_are_never_truncated() {
        // 4 processes × (1 header + 9 tasks) = 40 rows
        let processes: Vec<Process> = (0..4).map(|i| process(&format!("P{i}"), 9)).collect();
        let pages = LayoutEngine::default().layout(&processes);
        assert_eq!(pages.len(), 3);

        let laid_out: Vec<Row> = pages
            .iter()
            .flat_map(|p| p.rows.iter().filter(|r| !r.is_blank()).cloned())
            .collect();
        assert_eq!(laid_out, flatten(&processes));
    }

    #[test]
    fn capacity_one_still_terminates() {
        let engine = LayoutEngine::new(1).unwrap();
        let pages = engine.layout(&[process("A", 1), process("B", 1)]);
        assert_eq!(pages.len(), 4);
    }
}
