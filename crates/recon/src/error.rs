use thiserror::Error;

use crate::model::PersonId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty sheet name, duplicate column, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Identifier absent from the store that was asked for it.
    #[error("{registry}: id {id} not found")]
    NotFound { registry: &'static str, id: PersonId },
    /// The men index has no root.
    #[error("men index is empty")]
    EmptyIndex,
    /// A partial update tried to rewrite the sort key.
    #[error("field '{0}' is the registry key and cannot be edited")]
    ImmutableKey(String),
    /// A partial update named a field records do not have.
    #[error("unknown field '{0}' (expected last_name, first_name or status)")]
    UnknownField(String),
    /// Malformed `ID:FIELD=VALUE` edit expression.
    #[error("malformed edit '{0}' (expected ID:FIELD=VALUE)")]
    MalformedEdit(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
