// CSV directory import: one `<sheet>.csv` per registry sheet

use std::io::Read;
use std::path::Path;

use civreg_recon::RegistryConfig;
use tracing::info;

use crate::error::IoError;
use crate::sheet::{assemble, CellValue, SheetRows};
use crate::LoadedRegistry;

/// Load `<women>.csv`, `<men>.csv` and `<marriages>.csv` from `dir`, named
/// after the configured sheets.
pub fn load_dir(dir: &Path, config: &RegistryConfig) -> Result<LoadedRegistry, IoError> {
    let women = read_sheet(dir, &config.sheets.women, &config.columns.id)?;
    let men = read_sheet(dir, &config.sheets.men, &config.columns.id)?;
    let marriages = read_sheet(dir, &config.sheets.marriages, &config.columns.female_id)?;

    let loaded = assemble(&women, &men, &marriages, config)?;
    info!(dir = %dir.display(), stats = %loaded.stats.summary(), "registry loaded from CSV");
    Ok(loaded)
}

/// `key_column` is a header the sheet must carry; it anchors delimiter detection.
fn read_sheet(dir: &Path, sheet: &str, key_column: &str) -> Result<SheetRows, IoError> {
    let path = dir.join(format!("{sheet}.csv"));
    if !path.is_file() {
        return Err(IoError::MissingSheet {
            sheet: sheet.to_string(),
            available: csv_stems(dir),
        });
    }
    let content = read_file_as_utf8(&path)?;
    let grid = parse_grid(&content, sniff_delimiter(&content, key_column)).map_err(|message| IoError::Read {
        sheet: sheet.to_string(),
        message,
    })?;
    SheetRows::from_grid(sheet, grid)
}

/// Names of the CSV files in `dir`, for the missing-sheet message.
fn csv_stems(dir: &Path) -> Vec<String> {
    let mut stems: Vec<String> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    stems.sort();
    stems
}

/// Pick the field delimiter for a registry CSV.
///
/// Registry exports always carry a known header, so a candidate that splits
/// the first line into a field equal to `key_column` (case-insensitive) wins
/// outright. Otherwise fall back to consistency across the first few lines:
/// count fields per line for each candidate (tab, semicolon, comma) and keep
/// the one with the most consistent field count (>1 field).
fn sniff_delimiter(content: &str, key_column: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b','];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();
    let Some(header) = sample_lines.first() else {
        return b',';
    };

    let anchored = candidates.iter().copied().find(|&delim| {
        first_record(header, delim)
            .is_some_and(|fields| fields.iter().any(|f| f.trim().eq_ignore_ascii_case(key_column.trim())))
    });
    if let Some(delim) = anchored {
        return delim;
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| first_record(line, delim).map_or(1, |r| r.len()))
            .collect();

        // Must produce >1 field on the header line to be viable
        if counts[0] <= 1 {
            continue;
        }

        // Score: (lines with the header's field count) * field count.
        // More columns breaks ties: the registry sheets are at least 2 wide.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn first_record(line: &str, delimiter: u8) -> Option<csv::StringRecord> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
}

/// Read file and convert to UTF-8 if needed (Excel on Windows writes CSV as Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Strip a UTF-8 BOM so the first header matches
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn parse_grid(content: &str, delimiter: u8) -> Result<Vec<Vec<CellValue>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}
