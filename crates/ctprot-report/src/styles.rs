//! Cell formats for the comparison sheet.

use ctprot_model::SectionStyle;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder};

/// Section fill palette.
fn fill(style: SectionStyle) -> &'static str {
    match style {
        SectionStyle::Localizer => "#f4f5f7",
        SectionStyle::Monitoring => "#e6fcef",
        SectionStyle::Contrast => "#fdf2e9",
        SectionStyle::Scan => "#fefae7",
        SectionStyle::Recon => "#e9fcff",
        SectionStyle::Dose => "#fdebe6",
    }
}

/// Centered value cell for a section.
pub(crate) fn value(style: SectionStyle) -> Format {
    Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_background_color(fill(style))
}

/// Left-aligned parameter-name cell for a section.
pub(crate) fn label(style: SectionStyle) -> Format {
    Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_background_color(fill(style))
}

/// Section banner across all columns.
pub(crate) fn banner() -> Format {
    Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_background_color("#5e9cfb")
}

/// Protocol-name header cell.
pub(crate) fn title() -> Format {
    Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_background_color("#fefae7")
}

/// Bold dark red for mismatched cells.
pub(crate) fn emphasis() -> Format {
    Format::new().set_bold().set_font_color("#9c0006")
}
