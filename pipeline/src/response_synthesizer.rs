//! Query result → natural-language answer.

use std::sync::Arc;

use common::errors::AppResult;

use crate::llm::LlmClient;

/// Asks the model to explain a query result in prose.
pub struct ResponseSynthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// `result` may be an error message; it is embedded as-is.
    pub fn prompt(question: &str, query: &str, result: &str, schema: &str) -> String {
        format!(
            "Below is the schema of the MySQL database and the result of the query. Write a natural language response.\n\
             \n\
             {schema}\n\
             \n\
             Question: {question}\n\
             SQL query: {query}\n\
             Result: {result}\n\
             Response:"
        )
    }

    pub async fn synthesize(
        &self,
        question: &str,
        query: &str,
        result: &str,
        schema: &str,
    ) -> AppResult<String> {
        let prompt = Self::prompt(question, query, result, schema);
        tracing::debug!(%prompt, "回答生成提示词");
        self.llm.generate(&prompt, &self.model).await
    }
}
