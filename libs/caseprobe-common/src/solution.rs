//! Solution contract
//!
//! A solution is a pure routine from an ordered argument list to a JSON value.
//! Recognized failures are returned as `Err(SolutionError)`; anything else
//! (a panic) is treated by the harness as an unrecognized failure.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::types::InputVector;

pub type SolutionResult = Result<Value, SolutionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolutionError {
    /// Failure raised by the routine itself; reported verbatim
    #[error("{0}")]
    Message(String),

    #[error("missing argument at position {index}")]
    MissingArgument { index: usize },

    #[error("argument at position {index} is not {expected}")]
    InvalidArgument { index: usize, expected: &'static str },
}

impl SolutionError {
    pub fn new(message: impl Into<String>) -> Self {
        SolutionError::Message(message.into())
    }
}

/// A candidate routine the harness can run
pub trait Solution: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, input: &InputVector) -> SolutionResult;
}

/// Adapts a plain function or closure into a [`Solution`]
pub struct FnSolution<F> {
    name: String,
    func: F,
}

impl<F> FnSolution<F>
where
    F: Fn(&InputVector) -> SolutionResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Solution for FnSolution<F>
where
    F: Fn(&InputVector) -> SolutionResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, input: &InputVector) -> SolutionResult {
        (self.func)(input)
    }
}

impl<F> fmt::Debug for FnSolution<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSolution")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
