//! # repairdoc
//!
//! Repair confirmation (보수확인서) generation for construction contracts.
//!
//! A repair confirmation lists every work item carried out under a payment
//! round, grouped by process, on fixed-height table pages, followed by a
//! summary page with the cost totals. The page is the unit of layout: rows
//! are assigned to pages up front, a process heading is never left alone at
//! the bottom of a page, and every page is padded to the same row count so
//! printed sheets line up.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    Processes and tasks, leniently decoded
//!       ↓
//!   [layout]   Flatten, assign rows to pages, pad
//!       ↓
//!   [totals]   Cost sums over the input, not the pages
//!       ↓
//!   [render]   Pages to positioned draw commands
//!       ↓
//!   [pdf]      Serialize to PDF bytes
//! ```
//!
//! [`api`] fetches the contracts and payment data the documents are built
//! from.

pub mod api;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod style;
pub mod totals;

pub use error::{RepairDocError, Result};

use font::FontContext;
use layout::LayoutEngine;
use model::{Metadata, RepairDocument};
use pdf::PdfWriter;
use render::SheetRenderer;
use style::RenderConfig;

/// File name used when exporting without an explicit output path.
pub const DEFAULT_FILE_NAME: &str = "보수확인서.pdf";

/// Render a document to PDF bytes.
///
/// The configuration is validated first; a zero row count or a page with
/// no room for content is a [`RepairDocError::Config`].
pub fn render(
    document: &RepairDocument,
    config: &RenderConfig,
    fonts: &FontContext,
) -> Result<Vec<u8>> {
    config.validate()?;

    let engine = LayoutEngine::new(config.rows_per_page)?;
    let layout = engine.layout_document(document);
    let pages = SheetRenderer::new(config, fonts).render(&layout, &document.header);

    let metadata = Metadata {
        title: Some(
            document
                .header
                .title
                .clone()
                .unwrap_or_else(|| config.title.clone()),
        ),
        author: None,
        subject: document.header.contract_name.clone(),
    };
    PdfWriter::new().write(&pages, &metadata, fonts)
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str, config: &RenderConfig, fonts: &FontContext) -> Result<Vec<u8>> {
    let document: RepairDocument = serde_json::from_str(json)?;
    render(&document, config, fonts)
}
