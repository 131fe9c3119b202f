//! Query result models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rows materialized from one executed query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct QueryRows {
    /// Column names in result order.
    pub columns: Vec<String>,

    /// Row data (each row is a vector of JSON values).
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Query execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl QueryRows {
    /// Builds rows without column metadata.
    pub fn from_rows(rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Compact text form embedded in prompts, e.g. `[[3]]`.
    pub fn to_prompt_text(&self) -> String {
        serde_json::Value::Array(
            self.rows
                .iter()
                .map(|row| serde_json::Value::Array(row.clone()))
                .collect(),
        )
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_text() {
        let rows = QueryRows::from_rows(vec![vec![json!(3)]]);
        assert_eq!(rows.to_prompt_text(), "[[3]]");

        let rows = QueryRows::from_rows(vec![
            vec![json!(1), json!("Alice"), json!(null)],
            vec![json!(2), json!("Bob"), json!(4.5)],
        ]);
        assert_eq!(rows.to_prompt_text(), r#"[[1,"Alice",null],[2,"Bob",4.5]]"#);
    }

    #[test]
    fn test_empty_result() {
        let rows = QueryRows::default();
        assert_eq!(rows.row_count(), 0);
        assert_eq!(rows.to_prompt_text(), "[]");
    }
}
