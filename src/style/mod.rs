//! # Sheet Style
//!
//! Everything about how the repair confirmation looks: page geometry,
//! fonts, row heights, column widths, labels and colors. One immutable
//! [`RenderConfig`] value is built up front and passed by reference to every
//! rendering function; nothing reads styling from global state.

use serde::{Deserialize, Serialize};

use crate::error::{RepairDocError, Result};
use crate::layout::DEFAULT_ROWS_PER_PAGE;
use crate::model::{CostCategory, Edges, PageSize};

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn gray(level: f64) -> Self {
        Self::rgb(level, level, level)
    }
}

/// A descriptive (non-amount) field of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnField {
    Code,
    Name,
    Spec,
    Unit,
    UnitCount,
    CalcDetail,
    UnitPriceId,
}

impl ColumnField {
    /// Numeric fields are right-aligned and run through the formatter.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnField::UnitCount)
    }
}

/// One descriptive column of the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub field: ColumnField,
    pub label: String,
    /// Relative width. Widths are normalized against the sum of all columns.
    pub width: f64,
}

/// One cost category column group, split into cost and price sub-columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountColumnDef {
    pub category: CostCategoryName,
    pub label: String,
    /// Relative width of each of the two sub-columns.
    pub width: f64,
}

/// Serializable mirror of [`CostCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostCategoryName {
    Material,
    Labor,
    Expense,
    Total,
}

impl From<CostCategoryName> for CostCategory {
    fn from(name: CostCategoryName) -> Self {
        match name {
            CostCategoryName::Material => CostCategory::Material,
            CostCategoryName::Labor => CostCategory::Labor,
            CostCategoryName::Expense => CostCategory::Expense,
            CostCategoryName::Total => CostCategory::Total,
        }
    }
}

/// Fixed text printed on the sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Labels {
    pub cost: String,
    pub price: String,
    pub end_date: String,
    pub contract: String,
    pub center: String,
    pub round: String,
    pub order_number: String,
    pub issued_on: String,
    pub summary_title: String,
    pub summary_category: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            cost: "단가".to_string(),
            price: "금액".to_string(),
            end_date: "완료일".to_string(),
            contract: "계약명".to_string(),
            center: "센터".to_string(),
            round: "회차".to_string(),
            order_number: "작업지시번호".to_string(),
            issued_on: "작성일".to_string(),
            summary_title: "총괄 집계".to_string(),
            summary_category: "구분".to_string(),
        }
    }
}

/// A TrueType font file to register before rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    pub family: String,
    pub path: std::path::PathBuf,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    400
}

/// Immutable rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub page_size: PageSize,
    pub landscape: bool,
    pub margin: Edges,

    pub title: String,
    pub font_family: String,
    pub title_font_size: f64,
    pub info_font_size: f64,
    pub font_size: f64,

    /// Body rows per content page, padding included.
    pub rows_per_page: usize,
    pub row_height: f64,
    pub header_row_height: f64,
    pub cell_padding: f64,

    pub columns: Vec<ColumnDef>,
    pub amount_columns: Vec<AmountColumnDef>,
    pub labels: Labels,

    pub text_color: Color,
    pub border_color: Color,
    pub border_width: f64,
    pub header_fill: Color,
    pub process_fill: Color,

    /// Printed under the totals table on the summary page.
    pub footer_note: Option<String>,

    /// TrueType fonts to load; needed for Hangul text.
    pub fonts: Vec<FontEntry>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let column = |field, label: &str, width| ColumnDef {
            field,
            label: label.to_string(),
            width,
        };
        let amount = |category, label: &str| AmountColumnDef {
            category,
            label: label.to_string(),
            width: 0.06,
        };
        Self {
            page_size: PageSize::A4,
            landscape: true,
            margin: Edges::uniform(36.0),
            title: "보수확인서".to_string(),
            font_family: "Helvetica".to_string(),
            title_font_size: 18.0,
            info_font_size: 9.0,
            font_size: 8.0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            row_height: 20.0,
            header_row_height: 16.0,
            cell_padding: 3.0,
            columns: vec![
                column(ColumnField::Code, "코드", 0.06),
                column(ColumnField::Name, "품명", 0.12),
                column(ColumnField::Spec, "규격", 0.10),
                column(ColumnField::Unit, "단위", 0.04),
                column(ColumnField::UnitCount, "수량", 0.05),
                column(ColumnField::CalcDetail, "산출근거", 0.09),
                column(ColumnField::UnitPriceId, "일위대가", 0.06),
            ],
            amount_columns: vec![
                amount(CostCategoryName::Material, "재료비"),
                amount(CostCategoryName::Labor, "노무비"),
                amount(CostCategoryName::Expense, "경비"),
                amount(CostCategoryName::Total, "합계"),
            ],
            labels: Labels::default(),
            text_color: Color::BLACK,
            border_color: Color::gray(0.25),
            border_width: 0.5,
            header_fill: Color::gray(0.88),
            process_fill: Color::gray(0.95),
            footer_note: None,
            fonts: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// Page (width, height) in points, after orientation.
    pub fn page_dimensions(&self) -> (f64, f64) {
        let (w, h) = self.page_size.dimensions();
        if self.landscape {
            (w.max(h), w.min(h))
        } else {
            (w.min(h), w.max(h))
        }
    }

    pub fn content_width(&self) -> f64 {
        self.page_dimensions().0 - self.margin.horizontal()
    }

    pub fn content_height(&self) -> f64 {
        self.page_dimensions().1 - self.margin.vertical()
    }

    /// Height of the column header plus all body rows.
    pub fn table_height(&self) -> f64 {
        self.header_row_height * 2.0 + self.row_height * self.rows_per_page as f64
    }

    /// Reject values no page can be laid out with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| Err(RepairDocError::Config(what.to_string()));

        if self.rows_per_page == 0 {
            return invalid("rowsPerPage must be at least 1");
        }
        if self.row_height <= 0.0 || self.header_row_height <= 0.0 {
            return invalid("row heights must be positive");
        }
        if self.font_size <= 0.0 || self.title_font_size <= 0.0 || self.info_font_size <= 0.0 {
            return invalid("font sizes must be positive");
        }
        if self.content_width() <= 0.0 || self.content_height() <= 0.0 {
            return invalid("margins leave no room for content");
        }
        if self.columns.is_empty() && self.amount_columns.is_empty() {
            return invalid("at least one column is required");
        }
        let widths = self
            .columns
            .iter()
            .map(|c| c.width)
            .chain(self.amount_columns.iter().map(|c| c.width));
        for width in widths {
            if !(width > 0.0) {
                return invalid("column widths must be positive");
            }
        }
        Ok(())
    }
}
