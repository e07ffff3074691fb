//! Integration tests for resolved style values.

use trellis_style::error::parse_keyword;
use trellis_style::{
    Display, Edges, Float, Length, ListStylePosition, Position, Style, StyleError, TextAlign,
    WhiteSpace,
};

#[test]
fn test_display_keywords_parse() {
    assert_eq!("block".parse::<Display>().ok(), Some(Display::Block));
    assert_eq!(
        "table-header-group".parse::<Display>().ok(),
        Some(Display::TableHeaderGroup)
    );
    assert_eq!("Inline-Flex".parse::<Display>().ok(), Some(Display::InlineFlex));
    assert_eq!(Display::ListItem.as_ref(), "list-item");
}

#[test]
fn test_unknown_keyword_names_property() {
    let err = parse_keyword::<Display>("display", "grid-lanes").unwrap_err();
    assert_eq!(
        err,
        StyleError::UnknownKeyword {
            property: "display",
            value: "grid-lanes".to_string()
        }
    );
    assert_eq!(err.to_string(), "unknown display keyword 'grid-lanes'");
}

#[test]
fn test_display_classification() {
    assert!(Display::InlineTable.is_inline_level());
    assert!(!Display::Table.is_inline_level());
    assert!(Display::TableCell.is_table_part());
    assert!(Display::TableFooterGroup.is_row_group());
    assert!(!Display::TableRow.is_row_group());
    assert!(!Display::Block.is_table_part());
}

#[test]
fn test_length_parse() {
    assert_eq!("auto".parse::<Length>(), Ok(Length::Auto));
    assert_eq!("none".parse::<Length>(), Ok(Length::None));
    assert_eq!("12px".parse::<Length>(), Ok(Length::Fixed(12.0)));
    assert_eq!(" 7 ".parse::<Length>(), Ok(Length::Fixed(7.0)));
    assert_eq!("50%".parse::<Length>(), Ok(Length::Percent(50.0)));
    assert!(matches!(
        "12em".parse::<Length>(),
        Err(StyleError::InvalidLength(_))
    ));
}

#[test]
fn test_length_resolution() {
    let fixed = Length::Fixed(30.0);
    let percent = Length::Percent(25.0);

    assert!(fixed.is_fixed());
    assert!(percent.is_percent());
    assert!(Length::Auto.is_auto());
    assert!((fixed.value() - 30.0).abs() < f32::EPSILON);
    assert!((percent.value() - 25.0).abs() < f32::EPSILON);

    assert!((percent.calc(200.0) - 50.0).abs() < f32::EPSILON);
    assert!((Length::Auto.calc(200.0) - 200.0).abs() < f32::EPSILON);
    assert!((Length::None.calc(200.0) - 200.0).abs() < f32::EPSILON);
    assert!(Length::Auto.calc_min(200.0).abs() < f32::EPSILON);
    assert_eq!(percent.resolve(None), None);
    assert_eq!(percent.resolve(Some(80.0)), Some(20.0));
}

#[test]
fn test_anonymous_style_inherits_only_inherited_properties() {
    let parent = Style {
        display: Display::Block,
        text_align: TextAlign::Center,
        white_space: WhiteSpace::Nowrap,
        list_style_position: ListStylePosition::Inside,
        font_size: 20.0,
        float: Float::Left,
        position: Position::Relative,
        width: Length::Fixed(300.0),
        margin: Edges::all(Length::Fixed(8.0)),
        ..Style::default()
    };

    let anon = Style::anonymous(&parent, Display::Block);
    assert_eq!(anon.text_align, TextAlign::Center);
    assert_eq!(anon.white_space, WhiteSpace::Nowrap);
    assert_eq!(anon.list_style_position, ListStylePosition::Inside);
    assert!((anon.font_size - 20.0).abs() < f32::EPSILON);
    assert_eq!(anon.float, Float::None, "float is not inherited");
    assert_eq!(anon.position, Position::Static, "position is not inherited");
    assert_eq!(anon.width, Length::Auto, "width is not inherited");
    assert_eq!(anon.margin, Edges::all(Length::ZERO));
}

#[test]
fn test_floats_and_absolute_boxes_are_blockified() {
    let floated = Style {
        display: Display::Inline,
        float: Float::Right,
        ..Style::default()
    };
    assert!(!floated.is_inline_level());

    let absolute = Style {
        display: Display::InlineBlock,
        position: Position::Absolute,
        ..Style::default()
    };
    assert!(!absolute.is_inline_level());
    assert!(absolute.is_out_of_flow_positioned());

    let relative = Style {
        display: Display::InlineBlock,
        position: Position::Relative,
        ..Style::default()
    };
    assert!(relative.is_inline_level());
    assert!(relative.is_positioned());
}

#[test]
fn test_style_serializes() {
    let json = serde_json::to_value(Style::with_display(Display::TableCell)).unwrap();
    assert_eq!(json["display"], "TableCell");
    assert_eq!(json["border_spacing"][0], 2.0);
}
