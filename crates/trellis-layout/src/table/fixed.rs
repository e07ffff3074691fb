//! [§ 17.5.2.1 Fixed table layout](https://www.w3.org/TR/CSS2/tables.html#fixed-table-layout)
//!
//! "With this (fast) algorithm, the horizontal layout of the table does not
//! depend on the contents of the cells; it only depends on the table's
//! width, the width of the columns, and borders or cell spacing."

use crate::arena::BoxId;
use crate::error::TreeError;
use crate::tree::BoxTree;

use super::{declared_width, ColumnPlan};

/// Column widths from `<col>` boxes and the first row only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedTableLayout;

impl FixedTableLayout {
    /// "1. A column element with a value other than 'auto' for the 'width'
    /// property sets the width for that column.
    ///
    /// 2. Otherwise, a cell in the first row with a value other than 'auto'
    /// for the 'width' property determines the width for that column. If
    /// the cell spans more than one column, the width is divided over the
    /// columns."
    pub(crate) fn column_plan(
        self,
        tree: &BoxTree,
        table: BoxId,
        grid_width: f32,
    ) -> Result<ColumnPlan, TreeError> {
        let columns = tree.table(table)?.column_count;
        let mut plan = ColumnPlan::new(columns);

        let mut index = 0;
        for &column in tree.table(table)?.columns() {
            let span = tree.column_span(column)?;
            if let Some(width) = declared_width(&tree.get(column)?.style, grid_width) {
                for c in index..(index + span).min(columns) {
                    plan.min[c] = width;
                    plan.max[c] = width;
                    plan.fixed[c] = true;
                }
            }
            index += span;
        }

        for placement in tree.table_cells(table)? {
            if !placement.first_row {
                continue;
            }
            let Some(width) = declared_width(&tree.get(placement.cell)?.style, grid_width) else {
                continue;
            };
            let end = (placement.column + placement.col_span).min(columns);
            let open: Vec<usize> = (placement.column..end).filter(|&c| !plan.fixed[c]).collect();
            if open.is_empty() {
                continue;
            }
            let share = width / open.len() as f32;
            for c in open {
                plan.min[c] = share;
                plan.max[c] = share;
                plan.fixed[c] = true;
            }
        }
        Ok(plan)
    }

    /// "3. Any remaining columns equally divide the remaining horizontal
    /// table space (minus borders or cell spacing)."
    ///
    /// When every column has a width and the table is wider, the surplus is
    /// spread in proportion to the column widths.
    pub(crate) fn distribute(self, plan: &ColumnPlan, grid_width: f32) -> Vec<f32> {
        let mut widths = plan.max.clone();
        let known: f32 = plan
            .max
            .iter()
            .zip(&plan.fixed)
            .filter(|&(_, &fixed)| fixed)
            .map(|(w, _)| w)
            .sum();
        let remaining = (grid_width - known).max(0.0);
        let unknown = plan.fixed.iter().filter(|&&fixed| !fixed).count();

        if unknown > 0 {
            let share = remaining / unknown as f32;
            for (width, &fixed) in widths.iter_mut().zip(&plan.fixed) {
                if !fixed {
                    *width = share;
                }
            }
        } else if remaining > 0.0 && !widths.is_empty() {
            if known > 0.0 {
                for width in &mut widths {
                    *width += remaining * *width / known;
                }
            } else {
                let share = remaining / widths.len() as f32;
                for width in &mut widths {
                    *width += share;
                }
            }
        }
        widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(widths: &[Option<f32>]) -> ColumnPlan {
        ColumnPlan {
            min: widths.iter().map(|w| w.unwrap_or(0.0)).collect(),
            max: widths.iter().map(|w| w.unwrap_or(0.0)).collect(),
            fixed: widths.iter().map(Option::is_some).collect(),
        }
    }

    #[test]
    fn test_unknown_columns_share_the_rest_equally() {
        let widths = FixedTableLayout.distribute(&plan(&[Some(100.0), None, None]), 300.0);
        assert_eq!(widths, vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_surplus_is_spread_in_proportion() {
        let widths = FixedTableLayout.distribute(&plan(&[Some(100.0), Some(50.0)]), 300.0);
        assert_eq!(widths, vec![200.0, 100.0]);
    }

    #[test]
    fn test_too_narrow_table_keeps_declared_widths() {
        let widths = FixedTableLayout.distribute(&plan(&[Some(100.0), None]), 50.0);
        assert_eq!(widths, vec![100.0, 0.0]);
    }
}
