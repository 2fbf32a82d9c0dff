use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::BatchOutcome;

pub fn print_batch_summary(outcome: &BatchOutcome) {
    println!("Output: {}", outcome.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Protocol"),
        header_cell("Workbook"),
        header_cell("Status"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Center);

    let mut total_ok = 0usize;
    let mut total_failed = 0usize;
    for pair in &outcome.pairs {
        if pair.error.is_some() {
            total_failed += 1;
        } else {
            total_ok += 1;
        }
        table.add_row(vec![
            Cell::new(pair.relative.display())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            workbook_cell(pair.output.is_some()),
            status_cell(pair.error.is_some()),
            match &pair.error {
                Some(detail) => Cell::new(detail),
                None => dim_cell("-"),
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(total_ok, Color::Green).add_attribute(Attribute::Bold),
        count_cell(total_failed, Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_unmatched("Only in first snapshot", &outcome.only_first);
    print_unmatched("Only in second snapshot", &outcome.only_second);
}

fn print_unmatched(label: &str, paths: &[std::path::PathBuf]) {
    if paths.is_empty() {
        return;
    }
    println!("{label}:");
    for path in paths {
        println!("- {}", path.display());
    }
}

fn workbook_cell(written: bool) -> Cell {
    if written {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn status_cell(failed: bool) -> Cell {
    if failed {
        Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("ok").fg(Color::Green)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}
