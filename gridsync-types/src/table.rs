//! Remote table identity.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one table inside one worksheet of one remote workbook.
///
/// Supplied per call; nothing in the engine keeps a reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableHandle {
    /// Drive item id of the workbook.
    pub document_id: String,
    /// Worksheet id or name.
    pub sheet_id: String,
    /// Table id or name.
    pub table_id: String,
}

impl TableHandle {
    pub fn new(
        document_id: impl Into<String>,
        sheet_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            sheet_id: sheet_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Rejects handles with blank components.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("documentId", &self.document_id),
            ("sheetId", &self.sheet_id),
            ("tableId", &self.table_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidTable(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.document_id, self.sheet_id, self.table_id)
    }
}
