//! CSS Display property types
//!
//! [§ 2 Box Layout Modes: the display property](https://www.w3.org/TR/css-display-3/#the-display-properties)

use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};

/// [§ 2 Box Layout Modes](https://www.w3.org/TR/css-display-3/#the-display-properties)
///
/// "The display property defines an element's display type, which consists of
/// the two basic qualities of how an element generates boxes."
///
/// The layout core works with the full keyword rather than the
/// outer/inner pair: every keyword maps to exactly one box kind, and the
/// table-internal keywords have no outer/inner decomposition anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Display {
    /// "The element and its descendants generate no boxes or text runs."
    None,
    /// `display: inline`
    #[default]
    Inline,
    /// `display: block`
    Block,
    /// `display: list-item`
    ListItem,
    /// `display: inline-block`
    InlineBlock,
    /// `display: table`
    Table,
    /// `display: inline-table`
    InlineTable,
    /// `display: table-row-group`
    TableRowGroup,
    /// `display: table-header-group`
    TableHeaderGroup,
    /// `display: table-footer-group`
    TableFooterGroup,
    /// `display: table-row`
    TableRow,
    /// `display: table-column-group`
    TableColumnGroup,
    /// `display: table-column`
    TableColumn,
    /// `display: table-cell`
    TableCell,
    /// `display: table-caption`
    TableCaption,
    /// `display: flex`
    Flex,
    /// `display: inline-flex`
    InlineFlex,
}

impl Display {
    /// [§ 2.1 Outer Display Roles](https://www.w3.org/TR/css-display-3/#outer-role)
    ///
    /// "The element generates an inline-level box when placed in flow layout."
    #[must_use]
    pub const fn is_inline_level(self) -> bool {
        matches!(
            self,
            Self::Inline | Self::InlineBlock | Self::InlineTable | Self::InlineFlex
        )
    }

    /// [§ 2.4 Layout-Internal Display](https://www.w3.org/TR/css-display-3/#layout-specific-display)
    ///
    /// "Some layout models split boxes into several internal parts."
    #[must_use]
    pub const fn is_table_part(self) -> bool {
        matches!(
            self,
            Self::TableRowGroup
                | Self::TableHeaderGroup
                | Self::TableFooterGroup
                | Self::TableRow
                | Self::TableColumnGroup
                | Self::TableColumn
                | Self::TableCell
                | Self::TableCaption
        )
    }

    /// `table-row-group`, `table-header-group` or `table-footer-group`.
    #[must_use]
    pub const fn is_row_group(self) -> bool {
        matches!(
            self,
            Self::TableRowGroup | Self::TableHeaderGroup | Self::TableFooterGroup
        )
    }
}
