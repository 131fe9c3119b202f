//! Schema description models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One column with its declared type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
}

/// One table with its columns in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Renders `Table <name>:` followed by one `<column> (<type>)` line per column.
    pub fn render(&self) -> String {
        let mut out = format!("Table {}:", self.name);
        for column in &self.columns {
            out.push('\n');
            out.push_str(&column.name);
            out.push_str(" (");
            out.push_str(&column.data_type);
            out.push(')');
        }
        out
    }
}

/// Tables in engine order, plus the failure that stopped enumeration (if any).
///
/// Introspection is best-effort: tables gathered before a failure are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SchemaDescription {
    pub tables: Vec<TableDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SchemaDescription {
    /// Canonical text form used as prompt context.
    pub fn render(&self) -> String {
        let mut blocks: Vec<String> = self.tables.iter().map(TableDescriptor::render).collect();
        if let Some(failure) = &self.failure {
            blocks.push(failure.clone());
        }
        blocks.join("\n\n")
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}
