//! Question → SQL prompt.

use std::sync::Arc;

use common::errors::AppResult;

use crate::llm::LlmClient;

/// Asks the model for one SQL query answering a question.
///
/// The model output is returned verbatim; nothing is extracted or checked.
pub struct QuerySynthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl QuerySynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub fn prompt(question: &str, schema: &str) -> String {
        format!(
            "Below is the schema of the MySQL database. Write an SQL query based on the user's question.\n\
             \n\
             {schema}\n\
             \n\
             Question: {question}\n\
             SQL query:"
        )
    }

    pub async fn synthesize(&self, question: &str, schema: &str) -> AppResult<String> {
        let prompt = Self::prompt(question, schema);
        tracing::debug!(%prompt, "查询生成提示词");
        let query = self.llm.generate(&prompt, &self.model).await?;
        tracing::info!(model = %self.model, query = %query, "已生成 SQL");
        Ok(query)
    }
}
