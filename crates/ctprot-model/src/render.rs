//! Render instructions emitted by the merge engine.
//!
//! The engine never touches the spreadsheet library directly; it emits a
//! flat stream of instructions in final row order and the report crate
//! replays them into a workbook.

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Visual role of a section, resolved to fills and fonts by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionStyle {
    Localizer,
    Monitoring,
    Contrast,
    Scan,
    Recon,
    Dose,
}

/// Protocol column slot: 0 for the first protocol, 1 for the second.
pub type Slot = usize;

/// One cell-level instruction for the render sink.
///
/// Emission order equals final row order. Row 0 is reserved for the
/// protocol-name header written by the sink itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderOp {
    /// Section banner spanning the label column and all data columns.
    Banner {
        row: u32,
        label: String,
        style: SectionStyle,
    },
    /// Parameter name in the label column.
    FieldLabel {
        row: u32,
        text: String,
        style: SectionStyle,
    },
    /// Parameter value in one protocol's data column.
    FieldValue {
        row: u32,
        slot: Slot,
        value: CellValue,
        style: SectionStyle,
    },
}

impl RenderOp {
    pub fn row(&self) -> u32 {
        match self {
            Self::Banner { row, .. }
            | Self::FieldLabel { row, .. }
            | Self::FieldValue { row, .. } => *row,
        }
    }
}

/// Final row floor of a stream, where the sink appends the dose block.
pub fn last_row(ops: &[RenderOp]) -> u32 {
    ops.iter().map(RenderOp::row).max().unwrap_or(0)
}
