use serde::Deserialize;

use crate::error::RegistryError;
use crate::model::LabelLanguage;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Where to find the registries in the source workbook and how to render
/// statuses. Every section is optional; defaults are the civil registry's
/// own sheet and column names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub sheets: SheetNames,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub labels: LabelConfig,
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetNames {
    #[serde(default = "default_women_sheet")]
    pub women: String,
    #[serde(default = "default_men_sheet")]
    pub men: String,
    #[serde(default = "default_marriages_sheet")]
    pub marriages: String,
}

fn default_women_sheet() -> String {
    "Mujeres".into()
}

fn default_men_sheet() -> String {
    "Varones".into()
}

fn default_marriages_sheet() -> String {
    "Casamientos".into()
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            women: default_women_sheet(),
            men: default_men_sheet(),
            marriages: default_marriages_sheet(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header names. Person columns apply to both the women and men sheets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnMapping {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_last_name")]
    pub last_name: String,
    #[serde(default = "default_first_name")]
    pub first_name: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_female_id")]
    pub female_id: String,
    #[serde(default = "default_male_id")]
    pub male_id: String,
}

fn default_id() -> String {
    "DNI".into()
}

fn default_last_name() -> String {
    "Apellido".into()
}

fn default_first_name() -> String {
    "Nombre".into()
}

fn default_status() -> String {
    "EstadoCivil".into()
}

fn default_female_id() -> String {
    "DNI_Femenino".into()
}

fn default_male_id() -> String {
    "DNI_Masculino".into()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: default_id(),
            last_name: default_last_name(),
            first_name: default_first_name(),
            status: default_status(),
            female_id: default_female_id(),
            male_id: default_male_id(),
        }
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelConfig {
    #[serde(default)]
    pub language: LabelLanguage,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RegistryConfig {
    pub fn from_toml(input: &str) -> Result<Self, RegistryError> {
        let config: RegistryConfig =
            toml::from_str(input).map_err(|e| RegistryError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let sheets = [
            ("sheets.women", &self.sheets.women),
            ("sheets.men", &self.sheets.men),
            ("sheets.marriages", &self.sheets.marriages),
        ];
        let person_columns = [
            ("columns.id", &self.columns.id),
            ("columns.last_name", &self.columns.last_name),
            ("columns.first_name", &self.columns.first_name),
            ("columns.status", &self.columns.status),
        ];
        let event_columns = [
            ("columns.female_id", &self.columns.female_id),
            ("columns.male_id", &self.columns.male_id),
        ];

        for (key, value) in sheets.iter().chain(&person_columns).chain(&event_columns) {
            if value.trim().is_empty() {
                return Err(RegistryError::ConfigValidation(format!("{key} must not be empty")));
            }
        }

        reject_duplicates(&sheets)?;
        reject_duplicates(&person_columns)?;
        reject_duplicates(&event_columns)?;
        Ok(())
    }
}

fn reject_duplicates(entries: &[(&str, &String)]) -> Result<(), RegistryError> {
    for (i, (key_a, a)) in entries.iter().enumerate() {
        for (key_b, b) in &entries[i + 1..] {
            if a == b {
                return Err(RegistryError::ConfigValidation(format!(
                    "{key_a} and {key_b} are both '{a}'"
                )));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
