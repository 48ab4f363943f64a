//! Warehouse credential bundle

use serde::{Deserialize, Serialize};

use crate::{Result, SqlfanError};

/// Credentials for one warehouse account.
///
/// The bundle is handed to the driver untouched; SQLFAN only checks that
/// every field is present.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub account: String,
    pub role: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub user: String,
    pub password: String,
}

impl ConnectionParams {
    /// Names of the fields, in form order
    pub const FIELDS: [&'static str; 7] = [
        "account",
        "role",
        "warehouse",
        "database",
        "schema",
        "user",
        "password",
    ];

    fn field_values(&self) -> [&str; 7] {
        [
            &self.account,
            &self.role,
            &self.warehouse,
            &self.database,
            &self.schema,
            &self.user,
            &self.password,
        ]
    }

    /// Fields that are empty or whitespace only
    pub fn missing_fields(&self) -> Vec<&'static str> {
        Self::FIELDS
            .iter()
            .zip(self.field_values())
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fail with a validation error naming every missing field
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SqlfanError::Validation(format!(
                "missing connection fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("account", &self.account)
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}
