//! Human-readable registry tables.

use std::io::{self, Write};

use civreg_recon::config::RegistryConfig;
use civreg_recon::model::{PersonRecord, RegistryReport, Sex};
use unicode_width::UnicodeWidthStr;

/// Both registries: men ascending by id, then women in load order.
pub fn write_report(out: &mut impl Write, report: &RegistryReport, config: &RegistryConfig) -> io::Result<()> {
    writeln!(out, "--- {} ---", config.sheets.men.to_uppercase())?;
    write_people(out, &report.men, Sex::Male, config)?;
    writeln!(out)?;
    writeln!(out, "--- {} ---", config.sheets.women.to_uppercase())?;
    write_people(out, &report.women, Sex::Female, config)?;

    if !report.misses.is_empty() {
        writeln!(out)?;
        writeln!(out, "--- NOT FOUND ---")?;
        for miss in &report.misses {
            match miss.id {
                Some(id) => writeln!(out, "event {}: {} id {}", miss.event_index + 1, miss.side, id)?,
                None => writeln!(out, "event {}: {} id missing", miss.event_index + 1, miss.side)?,
            }
        }
    }
    Ok(())
}

/// Table of `id, first name, last name, status`.
pub fn write_people(
    out: &mut impl Write,
    records: &[PersonRecord],
    sex: Sex,
    config: &RegistryConfig,
) -> io::Result<()> {
    let columns = &config.columns;
    let header = [
        columns.id.clone(),
        columns.first_name.clone(),
        columns.last_name.clone(),
        columns.status.clone(),
    ];
    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                r.first_name.clone(),
                r.last_name.clone(),
                r.status.label(sex, config.labels.language).to_string(),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|h| h.width());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    write_row(out, &header, &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, cells: &[String; 4], widths: &[usize; 4]) -> io::Result<()> {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        if i + 1 < cells.len() {
            line.push_str(&" ".repeat(width - cell.width()));
        }
    }
    writeln!(out, "{line}")
}
