// Excel workbook import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: reads the women, men and marriage sheets into engine records.
// Export: writes the reconciled registries back as two sheets with the
//         same sheet and column names, statuses rendered as labels.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use civreg_recon::model::{PersonRecord, RegistryReport, Sex};
use civreg_recon::RegistryConfig;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, info};

use crate::error::IoError;
use crate::sheet::{assemble, CellValue, SheetRows};
use crate::LoadedRegistry;

/// Load the three registry sheets from a workbook.
pub fn load_workbook(path: &Path, config: &RegistryConfig) -> Result<LoadedRegistry, IoError> {
    if !path.exists() {
        return Err(IoError::MissingFile(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let available: Vec<String> = workbook.sheet_names().to_vec();
    debug!(path = %path.display(), sheets = ?available, "workbook opened");

    let mut read_sheet = |name: &str| -> Result<SheetRows, IoError> {
        if !available.iter().any(|s| s == name) {
            return Err(IoError::MissingSheet {
                sheet: name.to_string(),
                available: available.clone(),
            });
        }
        let range = workbook.worksheet_range(name).map_err(|e| IoError::Read {
            sheet: name.to_string(),
            message: e.to_string(),
        })?;
        let (start_row, _) = range.start().unwrap_or((0, 0));
        let grid: Vec<Vec<CellValue>> = range.rows().map(|row| row.iter().map(to_cell).collect()).collect();
        Ok(SheetRows::from_grid(name, grid)?.with_header_row(start_row as usize + 1))
    };

    let women = read_sheet(&config.sheets.women)?;
    let men = read_sheet(&config.sheets.men)?;
    let marriages = read_sheet(&config.sheets.marriages)?;

    let loaded = assemble(&women, &men, &marriages, config)?;
    info!(path = %path.display(), stats = %loaded.stats.summary(), "registry loaded from workbook");
    Ok(loaded)
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

/// Write the men (ascending id) and women (load order) registries.
pub fn export_workbook(report: &RegistryReport, path: &Path, config: &RegistryConfig) -> Result<(), IoError> {
    let write_err = |e: rust_xlsxwriter::XlsxError| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (sheet_name, records, sex) in [
        (&config.sheets.men, &report.men, Sex::Male),
        (&config.sheets.women, &report.women, Sex::Female),
    ] {
        let worksheet = workbook.add_worksheet().set_name(sheet_name).map_err(write_err)?;
        write_people(worksheet, records, sex, config, &header).map_err(write_err)?;
    }

    workbook.save(path).map_err(write_err)?;
    info!(path = %path.display(), men = report.men.len(), women = report.women.len(), "registry exported");
    Ok(())
}

fn write_people(
    worksheet: &mut Worksheet,
    records: &[PersonRecord],
    sex: Sex,
    config: &RegistryConfig,
    header: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let columns = &config.columns;
    for (col, name) in [&columns.id, &columns.last_name, &columns.first_name, &columns.status]
        .into_iter()
        .enumerate()
    {
        worksheet.write_string_with_format(0, col as u16, name, header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_number(row, 0, record.id.0 as f64)?;
        worksheet.write_string(row, 1, &record.last_name)?;
        worksheet.write_string(row, 2, &record.first_name)?;
        worksheet.write_string(row, 3, record.status.label(sex, config.labels.language))?;
    }
    Ok(())
}
