use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// National identity number. Sort key of the men index, key of the women table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl PersonId {
    /// Spreadsheet cells store numbers as floats. Only whole, non-negative
    /// values are identifiers.
    pub fn from_f64(n: f64) -> Option<Self> {
        if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n < u64::MAX as f64 {
            Some(Self(n as u64))
        } else {
            None
        }
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "21789423.0" is what a CSV export of a float cell looks like
        let digits = s.strip_suffix(".0").unwrap_or(s);
        digits.parse().map(Self)
    }
}

// ---------------------------------------------------------------------------
// Marital status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    /// Any other label from the source data ("Unión Libre", "Divorciado", ...).
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

/// Language used when rendering a status for display or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelLanguage {
    #[default]
    Es,
    En,
}

impl MaritalStatus {
    /// Case-insensitive parse. Recognises English and the sex-specific
    /// Spanish labels; anything else is kept verbatim as `Other`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "single" | "soltero" | "soltera" | "soltero/a" => Self::Single,
            "married" | "casado" | "casada" | "casado/a" => Self::Married,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn is_married(&self) -> bool {
        matches!(self, Self::Married)
    }

    /// Display label for a person of the given sex.
    pub fn label(&self, sex: Sex, language: LabelLanguage) -> &str {
        match (self, language) {
            (Self::Other(s), _) => s,
            (Self::Single, LabelLanguage::En) => "single",
            (Self::Married, LabelLanguage::En) => "married",
            (Self::Single, LabelLanguage::Es) => match sex {
                Sex::Female => "Soltera",
                Sex::Male => "Soltero",
            },
            (Self::Married, LabelLanguage::Es) => match sex {
                Sex::Female => "Casada",
                Sex::Male => "Casado",
            },
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Married => write!(f, "married"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// JSON carries the language-neutral form (`single`, `married`, or the raw
/// label). `[labels] language` applies to tables and workbook export only.
impl Serialize for MaritalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of either registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub last_name: String,
    pub first_name: String,
    pub status: MaritalStatus,
}

impl PersonRecord {
    pub fn new(
        id: PersonId,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        status: MaritalStatus,
    ) -> Self {
        Self {
            id,
            last_name: last_name.into(),
            first_name: first_name.into(),
            status,
        }
    }
}

/// A marriage pairing one woman and one man. Either id may be absent from
/// its registry, or missing from the source row altogether (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarriageEvent {
    pub female_id: Option<PersonId>,
    pub male_id: Option<PersonId>,
}

impl MarriageEvent {
    /// Event with both ids present.
    pub fn pair(female_id: PersonId, male_id: PersonId) -> Self {
        Self {
            female_id: Some(female_id),
            male_id: Some(male_id),
        }
    }
}

/// Result of inserting into either store. Both stores are first-write-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Fields to overwrite on one record. `None` leaves the field unchanged.
/// There is no `id` field: the key is never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub status: Option<MaritalStatus>,
}

impl RecordUpdate {
    pub fn status(status: MaritalStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_name.is_none() && self.first_name.is_none() && self.status.is_none()
    }

    /// Set one field from its textual name. Accepts English and Spanish
    /// column names.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), RegistryError> {
        match field.trim().to_lowercase().as_str() {
            "last_name" | "lastname" | "apellido" => self.last_name = Some(value.to_string()),
            "first_name" | "firstname" | "nombre" => self.first_name = Some(value.to_string()),
            "status" | "marital_status" | "estado_civil" | "estadocivil" => {
                self.status = Some(MaritalStatus::parse(value))
            }
            "id" | "dni" => return Err(RegistryError::ImmutableKey(field.trim().to_string())),
            other => return Err(RegistryError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Apply to a record in place.
    pub fn apply_to(&self, record: &mut PersonRecord) {
        if let Some(ref last_name) = self.last_name {
            record.last_name = last_name.clone();
        }
        if let Some(ref first_name) = self.first_name {
            record.first_name = first_name.clone();
        }
        if let Some(ref status) = self.status {
            record.status = status.clone();
        }
    }
}

/// Parse `ID:FIELD=VALUE[;FIELD=VALUE...]`.
pub fn parse_edit(expr: &str) -> Result<(PersonId, RecordUpdate), RegistryError> {
    let malformed = || RegistryError::MalformedEdit(expr.to_string());

    let (id_part, fields_part) = expr.split_once(':').ok_or_else(malformed)?;
    let id: PersonId = id_part.parse().map_err(|_| malformed())?;

    let mut update = RecordUpdate::default();
    for assignment in fields_part.split(';').filter(|a| !a.trim().is_empty()) {
        let (field, value) = assignment.split_once('=').ok_or_else(malformed)?;
        update.set_field(field, value.trim())?;
    }

    if update.is_empty() {
        return Err(malformed());
    }
    Ok((id, update))
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissSide {
    Female,
    Male,
}

impl fmt::Display for MissSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
        }
    }
}

/// One side of a marriage event whose id was not in its registry. `id` is
/// `None` when the source row had no usable id on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMiss {
    pub event_index: usize,
    pub side: MissSide,
    pub id: Option<PersonId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub single: usize,
    pub married: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub men: StatusCounts,
    pub women: StatusCounts,
    pub events: usize,
    pub women_updated: usize,
    pub men_updated: usize,
    pub misses: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub source: String,
    pub engine_version: String,
    pub run_at: String,
    pub reconciled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryReport {
    pub meta: ReportMeta,
    pub summary: RegistrySummary,
    /// Ascending by id.
    pub men: Vec<PersonRecord>,
    /// Load order.
    pub women: Vec<PersonRecord>,
    pub misses: Vec<EventMiss>,
}
