//! In-memory fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::{ColumnDescriptor, ConnectParams, QueryRows, TableDescriptor};

use crate::db::{Connector, DbSession};
use crate::llm::LlmClient;

/// Database whose tables and query answers are fixed up front.
#[derive(Clone)]
pub struct FakeDatabase {
    pub tables: Vec<TableDescriptor>,
    pub fail_listing: bool,
    pub fail_on_table: Option<String>,
    pub query_result: AppResult<QueryRows>,
    pub executed: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl FakeDatabase {
    pub fn new(tables: Vec<(&str, Vec<(&str, &str)>)>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(name, columns)| TableDescriptor {
                    name: name.to_string(),
                    columns: columns
                        .into_iter()
                        .map(|(name, data_type)| ColumnDescriptor {
                            name: name.to_string(),
                            data_type: data_type.to_string(),
                        })
                        .collect(),
                })
                .collect(),
            fail_listing: false,
            fail_on_table: None,
            query_result: Ok(QueryRows::default()),
            executed: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `users(id INT, name VARCHAR)`.
    pub fn users() -> Self {
        Self::new(vec![("users", vec![("id", "INT"), ("name", "VARCHAR")])])
    }

    pub fn with_result(mut self, result: AppResult<QueryRows>) -> Self {
        self.query_result = result;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DbSession for FakeDatabase {
    async fn list_tables(&self) -> AppResult<Vec<String>> {
        if self.fail_listing {
            return Err(AppError::Introspection("SHOW TABLES denied".into()));
        }
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn table_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        if self.fail_on_table.as_deref() == Some(table) {
            return Err(AppError::Introspection("SELECT command denied".into()));
        }
        self.tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| AppError::Introspection(format!("Table '{}' doesn't exist", table)))
    }

    async fn fetch_all(&self, sql: &str) -> AppResult<QueryRows> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.query_result.clone()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Connector that accepts one password and a fixed set of database names.
pub struct FakeConnector {
    pub password: String,
    pub databases: HashMap<String, FakeDatabase>,
    pub attempts: AtomicUsize,
}

impl FakeConnector {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            databases: HashMap::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn with_database(mut self, name: &str, database: FakeDatabase) -> Self {
        self.databases.insert(name.to_string(), database);
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, params: &ConnectParams) -> AppResult<Box<dyn DbSession>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if params.password != self.password {
            return Err(AppError::DatabaseConnection(format!(
                "Access denied for user '{}'@'{}'",
                params.username, params.host
            )));
        }
        match self.databases.get(&params.database) {
            Some(db) => Ok(Box::new(db.clone())),
            None => Err(AppError::DatabaseConnection(format!(
                "Unknown database '{}'",
                params.database
            ))),
        }
    }
}

pub fn params(database: &str, password: &str) -> ConnectParams {
    ConnectParams {
        host: "localhost".into(),
        port: 3306,
        username: "root".into(),
        password: password.into(),
        database: database.into(),
    }
}

/// Model that replays scripted answers and records every prompt.
#[derive(Default)]
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<AppResult<String>>>,
    pub prompts: Mutex<Vec<String>>,
    pub models: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(answers: Vec<AppResult<String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    pub fn replying(answers: &[&str]) -> Self {
        Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, prompt: &str, model: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.models.lock().unwrap().push(model.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::ModelResponse("script exhausted".into())))
    }
}

/// Model that answers with its own prompt.
pub struct EchoLlm;

#[async_trait]
impl LlmClient for EchoLlm {
    async fn generate(&self, prompt: &str, _model: &str) -> AppResult<String> {
        Ok(prompt.to_string())
    }
}
