//! # Document Model
//!
//! The input representation for the repair confirmation. A document is a
//! header plus an ordered list of processes, each process holding the work
//! items (tasks) carried out under it.
//!
//! Field names follow the JSON the payment API and the front-end exchange
//! (`camelCase`). Decoding is deliberately lenient: a missing, null, or
//! non-numeric amount becomes `0.0`, and a missing text field becomes the
//! empty string. A document never fails to render because one cell is bad.

pub mod lenient;

use serde::{Deserialize, Serialize};

/// A complete repair confirmation ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairDocument {
    /// Header information printed on every page.
    #[serde(default)]
    pub header: DocumentHeader,

    /// Processes in display order.
    #[serde(default)]
    pub processes: Vec<Process>,
}

/// Header fields printed above the table on every page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    /// Overrides the configured document title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
    /// Payment round the work belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<String>,
}

/// A named group of tasks sharing an end date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default, alias = "name", deserialize_with = "lenient::text")]
    pub process_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub end_date: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A single billable line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient::text")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, alias = "specification", deserialize_with = "lenient::text")]
    pub spec: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub unit_count: f64,
    #[serde(default, alias = "calculation", deserialize_with = "lenient::text")]
    pub calc_detail: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit_price_id: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub material_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub material_price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub labor_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub labor_price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expense_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expense_price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_price: f64,
}

/// A (cost, price) pair for one cost category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostPair {
    pub cost: f64,
    pub price: f64,
}

impl std::ops::AddAssign for CostPair {
    fn add_assign(&mut self, rhs: Self) {
        self.cost += rhs.cost;
        self.price += rhs.price;
    }
}

/// The four cost categories, in the order they appear on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostCategory {
    Material,
    Labor,
    Expense,
    Total,
}

impl CostCategory {
    pub const ALL: [CostCategory; 4] = [
        CostCategory::Material,
        CostCategory::Labor,
        CostCategory::Expense,
        CostCategory::Total,
    ];
}

impl Task {
    /// The (cost, price) pair for one category.
    pub fn pair(&self, category: CostCategory) -> CostPair {
        let (cost, price) = match category {
            CostCategory::Material => (self.material_cost, self.material_price),
            CostCategory::Labor => (self.labor_cost, self.labor_price),
            CostCategory::Expense => (self.expense_cost, self.expense_price),
            CostCategory::Total => (self.total_cost, self.total_price),
        };
        CostPair { cost, price }
    }
}

impl Process {
    pub fn new(process_name: &str, end_date: &str, tasks: Vec<Task>) -> Self {
        Self {
            process_name: process_name.to_string(),
            end_date: end_date.to_string(),
            tasks,
        }
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points, portrait.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}
