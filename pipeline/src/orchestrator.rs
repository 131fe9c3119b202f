//! Pipeline orchestration.
//!
//! One question runs query synthesis, execution and response synthesis in
//! that order. Each stage yields a tagged result; what happens on failure is
//! decided here, by [`PipelineConfig::forward_stage_errors`]:
//!
//! - forwarding (default): the failure's text is passed to the next stage as
//!   if it were a normal value, so the model can explain what went wrong;
//! - short-circuit: the first failure ends the run and becomes the reply.

use std::sync::Arc;

use common::config::PipelineConfig;
use common::errors::{AppError, NOT_CONNECTED_MESSAGE};
use common::models::TranscriptEntry;
use serde::Serialize;
use utoipa::ToSchema;

use crate::executor::QueryExecutor;
use crate::llm::LlmClient;
use crate::query_synthesizer::QuerySynthesizer;
use crate::response_synthesizer::ResponseSynthesizer;
use crate::session::Session;

/// Pipeline stage.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Connection and schema check before any work.
    Precondition,
    QuerySynthesis,
    QueryExecution,
    ResponseSynthesis,
}

/// A stage that failed during a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct StageFailure {
    pub stage: Stage,
    pub code: String,
    pub message: String,
}

/// Everything one question produced.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PipelineRun {
    /// Entries produced by this run, in order.
    pub entries: Vec<TranscriptEntry>,
    /// Text handed to the executor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_query: Option<String>,
    /// Result text handed to response synthesis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_result: Option<String>,
    pub failures: Vec<StageFailure>,
}

impl PipelineRun {
    fn record(&mut self, stage: Stage, err: &AppError) {
        self.failures.push(StageFailure {
            stage,
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }
}

/// Sequences the stages for one question at a time.
pub struct Pipeline {
    query_synthesizer: QuerySynthesizer,
    response_synthesizer: ResponseSynthesizer,
    policy: PipelineConfig,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, policy: PipelineConfig) -> Self {
        let model = model.into();
        Self {
            query_synthesizer: QuerySynthesizer::new(llm.clone(), model.clone()),
            response_synthesizer: ResponseSynthesizer::new(llm, model),
            policy,
        }
    }

    /// Answers `question`, returning the transcript entries it produced.
    pub async fn handle(&self, session: &mut Session, question: &str) -> Vec<TranscriptEntry> {
        self.run(session, question).await.entries
    }

    /// Like [`Pipeline::handle`], also reporting the intermediate values.
    ///
    /// Without a connection the run yields a single assistant entry with the
    /// "connect first" message; nothing is appended to the transcript and no
    /// stage is invoked.
    pub async fn run(&self, session: &mut Session, question: &str) -> PipelineRun {
        let mut run = PipelineRun::default();

        let schema = match session.connection.active() {
            Some(active) => active.schema_text().to_string(),
            None => {
                tracing::warn!(session_id = %session.id(), "未连接数据库，拒绝提问");
                run.entries.push(TranscriptEntry::assistant(NOT_CONNECTED_MESSAGE));
                run.record(Stage::Precondition, &AppError::NotConnected);
                return run;
            }
        };

        tracing::info!(session_id = %session.id(), question, "开始处理问题");
        run.entries.push(TranscriptEntry::user(question));

        let query = match self.query_synthesizer.synthesize(question, &schema).await {
            Ok(query) => query,
            Err(e) => {
                run.record(Stage::QuerySynthesis, &e);
                if !self.policy.forward_stage_errors {
                    return self.finish(session, run, e.to_string());
                }
                e.to_string()
            }
        };
        run.generated_query = Some(query.clone());

        let result = match QueryExecutor::execute(session.connection.session(), &query).await {
            Ok(rows) => rows.to_prompt_text(),
            Err(e) => {
                run.record(Stage::QueryExecution, &e);
                if !self.policy.forward_stage_errors {
                    return self.finish(session, run, e.to_string());
                }
                e.to_string()
            }
        };
        run.query_result = Some(result.clone());

        let answer = match self
            .response_synthesizer
            .synthesize(question, &query, &result, &schema)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                run.record(Stage::ResponseSynthesis, &e);
                e.to_string()
            }
        };

        self.finish(session, run, answer)
    }

    /// Appends the question and its reply to the transcript together, so a
    /// run dropped mid-flight leaves no unanswered question behind.
    fn finish(&self, session: &mut Session, mut run: PipelineRun, reply: String) -> PipelineRun {
        run.entries.push(TranscriptEntry::assistant(reply));
        for entry in &run.entries {
            session.transcript.push(entry.clone());
        }
        tracing::info!(
            session_id = %session.id(),
            failures = run.failures.len(),
            "问题处理完成"
        );
        run
    }
}
