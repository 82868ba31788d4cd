use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::solution::SolutionError;

/// Failure message used when a routine dies without a recognizable error
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// One named entry of a test-case document
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub key: String,
    /// `None` when the entry has no `input` field; such cases are skipped
    pub input: Option<Value>,
}

impl TestCase {
    /// Build a case from a `key: {"input": ...}` document entry.
    ///
    /// Bodies that are not objects have no `input` field by definition.
    pub fn from_entry(key: String, body: Value) -> Self {
        let input = match body {
            Value::Object(mut fields) => fields.remove("input"),
            _ => None,
        };
        Self { key, input }
    }
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("malformed test-case document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("test-case document must be an object of cases, found {0}")]
    NotAnObject(&'static str),
}

/// All cases of a test-case document, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSuite {
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn from_json_str(content: &str) -> Result<Self, SuiteError> {
        let document: Value = serde_json::from_str(content)?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> Result<Self, SuiteError> {
        match document {
            Value::Object(entries) => Ok(Self {
                cases: entries
                    .into_iter()
                    .map(|(key, body)| TestCase::from_entry(key, body))
                    .collect(),
            }),
            other => Err(SuiteError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Ordered argument list handed to a solution.
///
/// Built from a case's `input` by position, never by field name: an object
/// contributes its values in declaration order, an array its elements, `null`
/// nothing, and any other scalar becomes a single argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputVector(Vec<Value>);

impl InputVector {
    pub fn from_input(input: Value) -> Self {
        match input {
            Value::Object(fields) => Self(fields.into_iter().map(|(_, value)| value).collect()),
            Value::Array(items) => Self(items),
            Value::Null => Self(Vec::new()),
            scalar => Self(vec![scalar]),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn value_at(&self, index: usize) -> Result<&Value, SolutionError> {
        self.0
            .get(index)
            .ok_or(SolutionError::MissingArgument { index })
    }

    pub fn i64_at(&self, index: usize) -> Result<i64, SolutionError> {
        self.value_at(index)?
            .as_i64()
            .ok_or(SolutionError::InvalidArgument {
                index,
                expected: "an integer",
            })
    }

    pub fn f64_at(&self, index: usize) -> Result<f64, SolutionError> {
        self.value_at(index)?
            .as_f64()
            .ok_or(SolutionError::InvalidArgument {
                index,
                expected: "a number",
            })
    }

    pub fn str_at(&self, index: usize) -> Result<&str, SolutionError> {
        self.value_at(index)?
            .as_str()
            .ok_or(SolutionError::InvalidArgument {
                index,
                expected: "a string",
            })
    }
}

impl From<Vec<Value>> for InputVector {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<'a> IntoIterator for &'a InputVector {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of one solution invocation; exactly one variant holds
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success(Value),
    Failure(String),
}

impl ExecutionOutcome {
    pub fn unknown_failure() -> Self {
        ExecutionOutcome::Failure(UNKNOWN_ERROR_MESSAGE.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    pub fn status(&self) -> CaseStatus {
        match self {
            ExecutionOutcome::Success(_) => CaseStatus::Succeeded,
            ExecutionOutcome::Failure(_) => CaseStatus::Failed,
        }
    }
}

impl From<Result<Value, SolutionError>> for ExecutionOutcome {
    fn from(result: Result<Value, SolutionError>) -> Self {
        match result {
            Ok(value) => ExecutionOutcome::Success(value),
            Err(e) => ExecutionOutcome::Failure(e.to_string()),
        }
    }
}

/// Per-case lifecycle: `Pending -> Running -> {Succeeded, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Running => "running",
            CaseStatus::Succeeded => "succeeded",
            CaseStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Cumulative scheduler ticks of the process at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub system: u64,
}

impl CpuTicks {
    pub fn new(user: u64, system: u64) -> Self {
        Self { user, system }
    }

    /// Ticks consumed since `earlier`. Never negative: a counter that reads
    /// lower than before (e.g. an unreadable sample fell back to zero) yields 0.
    pub fn since(&self, earlier: &CpuTicks) -> CpuTicks {
        CpuTicks {
            user: self.user.saturating_sub(earlier.user),
            system: self.system.saturating_sub(earlier.system),
        }
    }
}

/// Resource figures measured around one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    pub utime: u64,
    pub stime: u64,
    /// Wall-clock seconds
    pub realtime: f64,
    /// Process peak resident set (kB) after the call; cumulative, not per case
    pub max_memory: u64,
}

/// Report record for a single case. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub result: Option<Value>,
    pub utime: u64,
    pub stime: u64,
    pub realtime: f64,
    pub max_memory: u64,
    pub stdout: String,
    pub stderr: Option<String>,
}

/// Ordered mapping from case key to report, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateReport {
    entries: IndexMap<String, CaseReport>,
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a report. A key seen before keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, report: CaseReport) {
        self.entries.insert(key.into(), report);
    }

    pub fn get(&self, key: &str) -> Option<&CaseReport> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CaseReport)> {
        self.entries.iter().map(|(key, report)| (key.as_str(), report))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
