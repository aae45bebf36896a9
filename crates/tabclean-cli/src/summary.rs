use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tabclean_core::{BatchReport, ColumnProfile, DatasetReport};
use tabclean_model::format_rounded;
use tabclean_transform::ImputationReport;

pub fn print_batch_summary(report: &BatchReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Status"),
        header_cell("Rows In"),
        header_cell("Rows Out"),
        header_cell("Imputed"),
        header_cell("Outputs"),
        header_cell("Error"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for dataset in &report.datasets {
        let imputed = dataset
            .imputation
            .as_ref()
            .map(ImputationReport::total_replaced);
        table.add_row(vec![
            Cell::new(&dataset.name).add_attribute(Attribute::Bold),
            status_cell(dataset),
            count_cell(dataset.rows_in),
            count_cell(dataset.rows_out),
            count_cell(imputed),
            Cell::new(dataset.outputs.len()),
            match &dataset.error {
                Some(error) => Cell::new(error).fg(Color::Red),
                None => dim_cell("-"),
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} ok / {} failed", report.succeeded(), report.failed()))
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(report.datasets.iter().map(|d| d.outputs.len()).sum::<usize>())
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_imputation_table(report);
}

/// Per-column statistics of every column that had values replaced.
fn print_imputation_table(report: &BatchReport) {
    let rows: Vec<(&str, &str, usize, Option<f64>)> = report
        .datasets
        .iter()
        .filter_map(|dataset| {
            dataset
                .imputation
                .as_ref()
                .map(|imputation| (dataset.name.as_str(), imputation))
        })
        .flat_map(|(name, imputation)| {
            imputation
                .imputed()
                .map(move |column| (name, column.column.as_str(), column.replaced, column.mean))
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Column"),
        header_cell("Replaced"),
        header_cell("Mean"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (dataset, column, replaced, mean) in rows {
        table.add_row(vec![
            Cell::new(dataset),
            Cell::new(column),
            Cell::new(replaced),
            mean.map_or_else(|| dim_cell("-"), |mean| Cell::new(format_rounded(mean, 6))),
        ]);
    }
    println!("{table}");
}

pub fn print_dataset_summary(report: &DatasetReport) {
    print_batch_summary(&BatchReport {
        datasets: vec![report.clone()],
    });
}

pub fn print_profile(input: &Path, profiles: &[ColumnProfile]) {
    println!("Input: {}", input.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Missing"),
        header_cell("Zeros"),
        header_cell("Mean"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for profile in profiles {
        table.add_row(vec![
            Cell::new(&profile.name),
            dim_cell(profile.kind),
            count_cell(Some(profile.missing)),
            count_cell(Some(profile.zeros)),
            profile
                .mean
                .map_or_else(|| dim_cell("-"), |mean| Cell::new(format_rounded(mean, 6))),
        ]);
    }
    println!("{table}");
}

fn status_cell(dataset: &DatasetReport) -> Cell {
    if dataset.succeeded() {
        Cell::new("ok").fg(Color::Green)
    } else {
        Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: Option<usize>) -> Cell {
    match count {
        Some(0) => dim_cell(0),
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn apply_table_style(table: &mut Table) {
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
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
