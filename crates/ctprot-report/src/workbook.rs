//! Workbook assembly from a render-instruction stream.

use std::path::Path;

use anyhow::{Context, Result};
use ctprot_model::{CellValue, RenderOp, SectionStyle, last_row};
use rust_xlsxwriter::{ConditionalFormatFormula, Workbook, Worksheet};
use tracing::info;

use crate::styles;

/// Rows covered by the mismatch conditional formats. The original sheets
/// never come close to this.
const HIGHLIGHT_ROWS: u32 = 1000;

const DOSE_FIELDS: [&str; 5] = [
    "CTDIvol (mGy)",
    "DLP (mGy*cm)",
    "Eff. Dose (mSv)",
    "Dose Notification (CTDIv)",
    "Dose Notification (DLP)",
];

/// Write the comparison sheet.
///
/// `names` are the two protocol display names for the header row. In
/// single mode the sheet has one data column and no mismatch
/// highlighting; slot 1 ops (duplicates of slot 0 by construction) are
/// not rendered.
pub fn write_workbook(path: &Path, names: [&str; 2], ops: &[RenderOp], single: bool) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let last_col: u16 = if single { 1 } else { 2 };
    let title = styles::title();

    sheet.set_row_height(0, 30)?;
    sheet.write_string_with_format(0, 0, "Protocol Name", &title)?;
    sheet.write_string_with_format(0, 1, names[0], &title)?;
    if !single {
        sheet.write_string_with_format(0, 2, names[1], &title)?;
    }

    let content_floor = last_row(ops);
    for op in ops {
        match op {
            RenderOp::Banner { row, label, style: _ } => {
                sheet.merge_range(*row, 0, *row, last_col, label, &styles::banner())?;
            }
            RenderOp::FieldLabel { row, text, style } => {
                sheet.write_string_with_format(*row, 0, text, &styles::label(*style))?;
            }
            RenderOp::FieldValue {
                row,
                slot,
                value,
                style,
            } => {
                if single && *slot == 1 {
                    continue;
                }
                let col = 1 + *slot as u16;
                let format = styles::value(*style);
                match value {
                    CellValue::Int(number) => {
                        sheet.write_number_with_format(*row, col, *number as f64, &format)?;
                    }
                    CellValue::Float(number) => {
                        sheet.write_number_with_format(*row, col, *number, &format)?;
                    }
                    CellValue::Text(text) => {
                        sheet.write_string_with_format(*row, col, text, &format)?;
                    }
                }
            }
        }
    }

    write_dose_block(sheet, content_floor, last_col)?;

    sheet.set_column_width(0, 40)?;
    sheet.set_column_width(1, 60)?;
    if !single {
        sheet.set_column_width(2, 60)?;

        // Highlight both sides of every differing row.
        let emphasis = styles::emphasis();
        let left = ConditionalFormatFormula::new()
            .set_rule("=$B2<>$C2")
            .set_format(&emphasis);
        sheet.add_conditional_format(1, 1, HIGHLIGHT_ROWS, 1, &left)?;
        let right = ConditionalFormatFormula::new()
            .set_rule("=$C2<>$B2")
            .set_format(&emphasis);
        sheet.add_conditional_format(1, 2, HIGHLIGHT_ROWS, 2, &right)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook to {}", path.display()))?;
    info!(path = %path.display(), rows = content_floor, "wrote comparison workbook");
    Ok(())
}

/// Empty dose-tracking rows appended after the comparison content, filled
/// in by hand during protocol review.
fn write_dose_block(sheet: &mut Worksheet, content_floor: u32, last_col: u16) -> Result<()> {
    let mut row = content_floor + 1;
    sheet.merge_range(row, 0, row, last_col, "Dose Info", &styles::banner())?;

    let label = styles::label(SectionStyle::Dose);
    let value = styles::value(SectionStyle::Dose);
    for field in DOSE_FIELDS {
        row += 1;
        sheet.write_string_with_format(row, 0, field, &label)?;
        for col in 1..=last_col {
            sheet.write_string_with_format(row, col, "", &value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctprot_merge::merge;
    use ctprot_model::{Entry, Protocol, ProtocolPair, VendorProfile};

    fn entry(pairs: &[(&str, &str)]) -> Entry {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    fn pair() -> ProtocolPair {
        let before = Protocol::new(
            "before",
            vec![
                entry(&[("Range", "\"Topogram\""), ("kVp", "120")]),
                entry(&[("Range", "\"Abdomen\""), ("kVp", "100")]),
                entry(&[("ReconJob", "1"), ("Kernel", "\"Br40\"")]),
            ],
        );
        let after = Protocol::new(
            "after",
            vec![
                entry(&[("Range", "\"Topogram\""), ("kVp", "120")]),
                entry(&[("Range", "\"Abdomen\""), ("kVp", "120")]),
            ],
        );
        ProtocolPair::new(before, after)
    }

    #[test]
    fn writes_a_two_column_workbook() {
        let profile = VendorProfile::siemens_force();
        let pair = pair();
        let ops = merge(&profile, &pair).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compare.xlsx");
        write_workbook(&path, pair.names(), &ops, false).unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size > 0);
    }

    #[test]
    fn writes_a_single_column_workbook() {
        let profile = VendorProfile::siemens_force();
        let pair = ProtocolPair::single(pair().protocols[0].clone());
        let ops = merge(&profile, &pair).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.xlsx");
        write_workbook(&path, pair.names(), &ops, pair.single).unwrap();
        assert!(path.is_file());
    }
}
