//! Totals for the summary page.
//!
//! Totals are summed over the input processes, never over laid-out rows,
//! so re-paginating a document cannot change them.

use serde::Serialize;

use crate::model::{CostCategory, CostPair, Process};

/// Sum of every task's cost/price pairs across the whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSummary {
    pub material: CostPair,
    pub labor: CostPair,
    pub expense: CostPair,
    pub total: CostPair,
}

impl TotalsSummary {
    pub fn from_processes(processes: &[Process]) -> Self {
        let mut totals = TotalsSummary::default();
        for task in processes.iter().flat_map(|p| p.tasks.iter()) {
            for category in CostCategory::ALL {
                *totals.pair_mut(category) += task.pair(category);
            }
        }
        totals
    }

    pub fn pair(&self, category: CostCategory) -> CostPair {
        match category {
            CostCategory::Material => self.material,
            CostCategory::Labor => self.labor,
            CostCategory::Expense => self.expense,
            CostCategory::Total => self.total,
        }
    }

    fn pair_mut(&mut self, category: CostCategory) -> &mut CostPair {
        match category {
            CostCategory::Material => &mut self.material,
            CostCategory::Labor => &mut self.labor,
            CostCategory::Expense => &mut self.expense,
            CostCategory::Total => &mut self.total,
        }
    }
}
