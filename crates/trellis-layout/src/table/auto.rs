//! [§ 17.5.2.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
//!
//! "In this algorithm (which generally requires no more than two passes),
//! the table's width is given by the width of its columns (and intervening
//! borders)."

use trellis_style::Length;

use crate::arena::BoxId;
use crate::error::TreeError;
use crate::layout::LayoutContext;
use crate::tree::BoxTree;

use super::{declared_width, distribute_largest_remainder, ColumnPlan};

/// Column widths from the content of every cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoTableLayout;

impl AutoTableLayout {
    pub(crate) fn column_plan(
        self,
        tree: &BoxTree,
        table: BoxId,
        grid_width: f32,
        ctx: &LayoutContext<'_>,
    ) -> Result<ColumnPlan, TreeError> {
        let columns = tree.table(table)?.column_count;
        let spacing = tree.style(table)?.border_spacing.0;
        let mut plan = ColumnPlan::new(columns);

        // STEP 1: Column boxes.
        //
        // "Calculate the minimum content width (MCW) of each cell [...] If
        // the specified 'width' (W) of the cell is greater than MCW, W is the
        // minimum cell width."
        //
        // A column box with a width acts like a cell of that width.
        let mut index = 0;
        for &column in tree.table(table)?.columns() {
            let span = tree.column_span(column)?;
            let style = &tree.get(column)?.style;
            if let Some(width) = declared_width(style, grid_width) {
                for c in index..(index + span).min(columns) {
                    plan.min[c] = plan.min[c].max(width);
                    plan.max[c] = plan.max[c].max(width);
                    plan.fixed[c] |= matches!(style.width, Length::Fixed(_));
                }
            }
            index += span;
        }

        // STEP 2: Non-spanning cells.
        //
        // "For each column, determine a maximum and minimum column width
        // from the cells that span only that column. The minimum is that
        // required by the cell with the largest minimum cell width (or the
        // column 'width', whichever is larger). The maximum is that required
        // by the cell with the largest maximum cell width (or the column
        // 'width', whichever is larger)."
        let mut spanning = Vec::new();
        for placement in tree.table_cells(table)? {
            if placement.column >= columns {
                continue;
            }
            let style = &tree.get(placement.cell)?.style;
            let preferred = tree.preferred_widths(placement.cell, ctx)?;
            let declared = declared_width(style, grid_width);
            let min = preferred.min.max(declared.unwrap_or(0.0));
            let max = declared.map_or(preferred.max, |w| w.max(preferred.min)).max(min);
            if placement.col_span == 1 {
                let c = placement.column;
                plan.min[c] = plan.min[c].max(min);
                plan.max[c] = plan.max[c].max(max);
                plan.fixed[c] |= matches!(style.width, Length::Fixed(_));
            } else {
                spanning.push((placement.column, placement.col_span, min, max));
            }
        }
        for c in 0..columns {
            plan.max[c] = plan.max[c].max(plan.min[c]);
        }

        // STEP 3: Spanning cells, narrowest span first.
        //
        // "For each cell that spans more than one column, increase the
        // minimum widths of the columns it spans so that together, they are
        // at least as wide as the cell. Do the same for the maximum widths."
        spanning.sort_by_key(|&(_, span, _, _)| span);
        for (column, span, min, max) in spanning {
            let end = (column + span).min(columns);
            let inner_spacing = spacing * (end - column).saturating_sub(1) as f32;
            let weights: Vec<f32> = plan.max[column..end].to_vec();

            let have_min: f32 = plan.min[column..end].iter().sum::<f32>() + inner_spacing;
            if min > have_min {
                let shares = distribute_largest_remainder(min - have_min, &weights);
                for (c, share) in (column..end).zip(shares) {
                    plan.min[c] += share;
                }
            }
            let have_max: f32 = plan.max[column..end].iter().sum::<f32>() + inner_spacing;
            if max > have_max {
                let shares = distribute_largest_remainder(max - have_max, &weights);
                for (c, share) in (column..end).zip(shares) {
                    plan.max[c] += share;
                }
            }
            for c in column..end {
                plan.max[c] = plan.max[c].max(plan.min[c]);
            }
        }
        Ok(plan)
    }

    /// [§ 17.5.2.2](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
    ///
    /// "If the used width is greater than MIN, the extra width should be
    /// distributed over the columns."
    ///
    /// - At or above the sum of maximum widths, every column gets its
    ///   maximum and the surplus goes to columns without a fixed width, in
    ///   proportion to their maximum.
    /// - At or below the sum of minimum widths, every column gets its
    ///   minimum.
    /// - In between, each column moves from its minimum toward its maximum
    ///   by the same fraction.
    pub(crate) fn distribute(self, plan: &ColumnPlan, grid_width: f32) -> Vec<f32> {
        let total_min = plan.total_min();
        let total_max = plan.total_max();

        if grid_width >= total_max {
            let mut widths = plan.max.clone();
            let surplus = grid_width - total_max;
            if surplus <= 0.0 || widths.is_empty() {
                return widths;
            }
            let flexible: Vec<usize> = (0..widths.len()).filter(|&c| !plan.fixed[c]).collect();
            let targets: Vec<usize> = if flexible.is_empty() {
                (0..widths.len()).collect()
            } else {
                flexible
            };
            let weight: f32 = targets.iter().map(|&c| widths[c]).sum();
            let count = targets.len() as f32;
            for c in targets {
                let share = if weight > 0.0 { widths[c] / weight } else { 1.0 / count };
                widths[c] += surplus * share;
            }
            return widths;
        }

        if grid_width <= total_min {
            return plan.min.clone();
        }

        let fraction = (grid_width - total_min) / (total_max - total_min);
        plan.min
            .iter()
            .zip(&plan.max)
            .map(|(&min, &max)| min + (max - min) * fraction)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(min: &[f32], max: &[f32], fixed: &[bool]) -> ColumnPlan {
        ColumnPlan {
            min: min.to_vec(),
            max: max.to_vec(),
            fixed: fixed.to_vec(),
        }
    }

    #[test]
    fn test_surplus_goes_to_auto_columns() {
        let p = plan(&[10.0, 10.0], &[50.0, 100.0], &[true, false]);
        assert_eq!(AutoTableLayout.distribute(&p, 200.0), vec![50.0, 150.0]);
    }

    #[test]
    fn test_narrow_table_uses_minimums() {
        let p = plan(&[10.0, 20.0], &[50.0, 100.0], &[false, false]);
        assert_eq!(AutoTableLayout.distribute(&p, 5.0), vec![10.0, 20.0]);
    }

    #[test]
    fn test_interpolates_between_min_and_max() {
        let p = plan(&[10.0, 20.0], &[50.0, 100.0], &[false, false]);
        // Halfway between 30 and 150.
        assert_eq!(AutoTableLayout.distribute(&p, 90.0), vec![30.0, 60.0]);
    }
}
