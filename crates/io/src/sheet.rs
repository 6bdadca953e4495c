// Source-agnostic sheet rows → registry records.
//
// Both the workbook and CSV loaders reduce a sheet to a header row plus
// data rows of `CellValue`, then share the column lookup and record
// conversion below.

use std::collections::HashMap;

use civreg_recon::config::ColumnMapping;
use civreg_recon::model::{MaritalStatus, MarriageEvent, PersonId, PersonRecord};
use civreg_recon::RegistryConfig;
use tracing::{debug, warn};

use crate::error::IoError;
use crate::LoadedRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Text as shown in a cell: whole numbers without decimals.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    pub fn to_person_id(&self) -> Option<PersonId> {
        match self {
            Self::Empty => None,
            Self::Text(s) => s.parse().ok(),
            Self::Number(n) => PersonId::from_f64(*n),
        }
    }
}

/// One sheet: header names plus data rows.
#[derive(Debug, Clone)]
pub struct SheetRows {
    pub name: String,
    /// 1-based sheet row holding the headers.
    pub header_row: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetRows {
    /// Split the first row off as headers.
    pub fn from_grid(name: &str, mut grid: Vec<Vec<CellValue>>) -> Result<Self, IoError> {
        if grid.is_empty() {
            return Err(IoError::MissingHeader { sheet: name.to_string() });
        }
        let headers: Vec<String> = grid.remove(0).iter().map(CellValue::to_text).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(IoError::MissingHeader { sheet: name.to_string() });
        }
        Ok(Self {
            name: name.to_string(),
            header_row: 1,
            headers,
            rows: grid,
        })
    }

    /// For ranges that do not start at row 1.
    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    /// Case-insensitive header lookup.
    pub fn column(&self, name: &str) -> Result<usize, IoError> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h == wanted)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| IoError::MissingColumn {
                sheet: self.name.clone(),
                column: name.to_string(),
            })
    }

    fn data_rows(&self) -> impl Iterator<Item = (usize, &Vec<CellValue>)> + '_ {
        let first_data_row = self.header_row + 1;
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (first_data_row + i, row))
            .filter(|(_, row)| !row.iter().all(CellValue::is_empty))
    }
}

static EMPTY: CellValue = CellValue::Empty;

fn cell(row: &[CellValue], idx: usize) -> &CellValue {
    row.get(idx).unwrap_or(&EMPTY)
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// A data row that could not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub sheet: String,
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub women_rows: usize,
    pub men_rows: usize,
    pub marriage_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadStats {
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} women", self.women_rows),
            format!("{} men", self.men_rows),
            format!("{} marriages", self.marriage_rows),
        ];
        if !self.skipped.is_empty() {
            parts.push(format!("{} rows skipped", self.skipped.len()));
        }
        parts.join(", ")
    }

    fn skip(&mut self, sheet: &str, row: usize, reason: String) {
        warn!(sheet, row, %reason, "row skipped");
        self.skipped.push(SkippedRow {
            sheet: sheet.to_string(),
            row,
            reason,
        });
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Person rows. Rows without a usable id are skipped; empty names and
/// statuses are allowed.
pub fn read_people(
    sheet: &SheetRows,
    columns: &ColumnMapping,
    stats: &mut LoadStats,
) -> Result<Vec<PersonRecord>, IoError> {
    let people = read_people_with_rows(sheet, columns, stats)?;
    Ok(people.into_iter().map(|(_, record)| record).collect())
}

/// Like [`read_people`], keeping each record's sheet row.
fn read_people_with_rows(
    sheet: &SheetRows,
    columns: &ColumnMapping,
    stats: &mut LoadStats,
) -> Result<Vec<(usize, PersonRecord)>, IoError> {
    let id_idx = sheet.column(&columns.id)?;
    let last_idx = sheet.column(&columns.last_name)?;
    let first_idx = sheet.column(&columns.first_name)?;
    let status_idx = sheet.column(&columns.status)?;

    let mut people = Vec::new();
    for (row_no, row) in sheet.data_rows() {
        let id_cell = cell(row, id_idx);
        let Some(id) = id_cell.to_person_id() else {
            stats.skip(&sheet.name, row_no, format!("invalid {} '{}'", columns.id, id_cell.to_text()));
            continue;
        };
        let record = PersonRecord {
            id,
            last_name: cell(row, last_idx).to_text(),
            first_name: cell(row, first_idx).to_text(),
            status: MaritalStatus::parse(&cell(row, status_idx).to_text()),
        };
        people.push((row_no, record));
    }

    debug!(sheet = %sheet.name, records = people.len(), "person rows read");
    Ok(people)
}

/// The women registry is a table keyed by id, so a repeated id means the
/// sheet cannot be loaded at all.
fn require_unique_ids(sheet: &SheetRows, people: &[(usize, PersonRecord)]) -> Result<(), IoError> {
    let mut first_rows: HashMap<PersonId, usize> = HashMap::with_capacity(people.len());
    for &(row, ref record) in people {
        if let Some(&first_row) = first_rows.get(&record.id) {
            return Err(IoError::DuplicateId {
                sheet: sheet.name.clone(),
                id: record.id,
                first_row,
                row,
            });
        }
        first_rows.insert(record.id, row);
    }
    Ok(())
}

/// Marriage rows, in sheet order. A side whose id cell is empty or
/// unparseable becomes `None` and is reported as a miss when the events are
/// applied; only rows with no usable id on either side are skipped.
pub fn read_marriages(
    sheet: &SheetRows,
    columns: &ColumnMapping,
    stats: &mut LoadStats,
) -> Result<Vec<MarriageEvent>, IoError> {
    let female_idx = sheet.column(&columns.female_id)?;
    let male_idx = sheet.column(&columns.male_id)?;

    let mut events = Vec::new();
    for (row_no, row) in sheet.data_rows() {
        let female = cell(row, female_idx);
        let male = cell(row, male_idx);
        let event = MarriageEvent {
            female_id: female.to_person_id(),
            male_id: male.to_person_id(),
        };

        if event.female_id.is_none() && event.male_id.is_none() {
            stats.skip(
                &sheet.name,
                row_no,
                format!(
                    "invalid {} '{}' / {} '{}'",
                    columns.female_id,
                    female.to_text(),
                    columns.male_id,
                    male.to_text()
                ),
            );
            continue;
        }
        for (column, value, id) in [
            (&columns.female_id, female, event.female_id),
            (&columns.male_id, male, event.male_id),
        ] {
            if id.is_none() {
                warn!(sheet = %sheet.name, row = row_no, column = %column, value = %value.to_text(), "marriage row has no usable id on one side");
            }
        }
        events.push(event);
    }

    debug!(sheet = %sheet.name, events = events.len(), "marriage rows read");
    Ok(events)
}

/// Convert the three sheets into engine input. Repeated women ids fail the
/// whole load; repeated men ids are left to the index (first row wins).
pub fn assemble(
    women: &SheetRows,
    men: &SheetRows,
    marriages: &SheetRows,
    config: &RegistryConfig,
) -> Result<LoadedRegistry, IoError> {
    let mut stats = LoadStats::default();
    let women_rows = read_people_with_rows(women, &config.columns, &mut stats)?;
    require_unique_ids(women, &women_rows)?;
    let women_records: Vec<PersonRecord> = women_rows.into_iter().map(|(_, record)| record).collect();
    let men_records = read_people(men, &config.columns, &mut stats)?;
    let events = read_marriages(marriages, &config.columns, &mut stats)?;

    stats.women_rows = women_records.len();
    stats.men_rows = men_records.len();
    stats.marriage_rows = events.len();

    Ok(LoadedRegistry {
        women: women_records,
        men: men_records,
        marriages: events,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    fn people_sheet() -> SheetRows {
        SheetRows::from_grid(
            "Varones",
            vec![
                vec![text("DNI"), text("Apellido"), text("Nombre"), text("EstadoCivil")],
                vec![CellValue::Number(21789423.0), text("Gómez"), text("Luis"), text("Casado")],
                vec![text("30111222"), text(" Díaz "), text("Ana"), CellValue::Empty],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty],
                vec![text("n/a"), text("Ruiz"), text("Eva"), text("Soltero")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn cell_text_formats_whole_numbers() {
        assert_eq!(CellValue::Number(1001.0).to_text(), "1001");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
        assert_eq!(text("  x ").to_text(), "x");
    }

    #[test]
    fn reads_people_and_skips_bad_ids() {
        let mut stats = LoadStats::default();
        let people = read_people(&people_sheet(), &ColumnMapping::default(), &mut stats).unwrap();

        assert_eq!(people.len(), 2);
        assert_eq!(people[0].id, PersonId(21789423));
        assert_eq!(people[0].status, MaritalStatus::Married);
        assert_eq!(people[1].last_name, "Díaz");
        assert_eq!(people[1].status, MaritalStatus::Single);

        // blank row 4 is ignored, row 5 has a bad id
        assert_eq!(
            stats.skipped,
            vec![SkippedRow {
                sheet: "Varones".into(),
                row: 5,
                reason: "invalid DNI 'n/a'".into(),
            }]
        );
    }

    #[test]
    fn column_lookup_ignores_case() {
        let sheet = SheetRows::from_grid("S", vec![vec![text("dni"), text("APELLIDO")]]).unwrap();
        assert_eq!(sheet.column("DNI").unwrap(), 0);
        assert_eq!(sheet.column("Apellido").unwrap(), 1);
        let err = sheet.column("Nombre").unwrap_err();
        assert_eq!(err.to_string(), "sheet 'S': missing column 'Nombre'");
    }

    #[test]
    fn empty_sheet_has_no_header() {
        assert!(matches!(
            SheetRows::from_grid("Casamientos", vec![]),
            Err(IoError::MissingHeader { .. })
        ));
    }

    #[test]
    fn marriage_with_one_side_missing_keeps_the_other() {
        let sheet = SheetRows::from_grid(
            "Casamientos",
            vec![
                vec![text("DNI_Femenino"), text("DNI_Masculino")],
                vec![CellValue::Number(2001.0), CellValue::Number(1002.0)],
                vec![CellValue::Empty, CellValue::Number(1001.0)],
                vec![text("2002"), text("s/d")],
                vec![text("?"), CellValue::Empty],
            ],
        )
        .unwrap();
        let mut stats = LoadStats::default();
        let events = read_marriages(&sheet, &ColumnMapping::default(), &mut stats).unwrap();
        assert_eq!(
            events,
            vec![
                MarriageEvent::pair(PersonId(2001), PersonId(1002)),
                MarriageEvent { female_id: None, male_id: Some(PersonId(1001)) },
                MarriageEvent { female_id: Some(PersonId(2002)), male_id: None },
            ]
        );
        // only the row with neither id is dropped
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].row, 5);
    }

    fn women_sheet(rows: Vec<Vec<CellValue>>) -> SheetRows {
        let mut grid = vec![vec![text("DNI"), text("Apellido"), text("Nombre"), text("EstadoCivil")]];
        grid.extend(rows);
        SheetRows::from_grid("Mujeres", grid).unwrap()
    }

    fn marriages_sheet() -> SheetRows {
        SheetRows::from_grid("Casamientos", vec![vec![text("DNI_Femenino"), text("DNI_Masculino")]]).unwrap()
    }

    #[test]
    fn repeated_woman_id_fails_the_load() {
        let women = women_sheet(vec![
            vec![text("2001"), text("López"), text("María"), text("Soltera")],
            vec![text("2002"), text("Díaz"), text("Ana"), text("Casada")],
            vec![CellValue::Number(2001.0), text("López"), text("Marta"), text("Soltera")],
        ]);
        let err = assemble(&women, &people_sheet(), &marriages_sheet(), &RegistryConfig::default()).unwrap_err();

        assert!(matches!(err, IoError::DuplicateId { id: PersonId(2001), first_row: 2, row: 4, .. }));
        assert_eq!(err.to_string(), "sheet 'Mujeres': id 2001 appears at rows 2 and 4");
    }

    #[test]
    fn repeated_man_id_is_left_to_the_index() {
        let women = women_sheet(vec![vec![text("2001"), text("López"), text("María"), text("Soltera")]]);
        let men = SheetRows::from_grid(
            "Varones",
            vec![
                vec![text("DNI"), text("Apellido"), text("Nombre"), text("EstadoCivil")],
                vec![text("1001"), text("Pérez"), text("Juan"), text("Soltero")],
                vec![text("1001"), text("Otro"), text("Juan"), text("Casado")],
            ],
        )
        .unwrap();
        let loaded = assemble(&women, &men, &marriages_sheet(), &RegistryConfig::default()).unwrap();
        assert_eq!(loaded.men.len(), 2);
        assert_eq!(loaded.women.len(), 1);
    }
}
