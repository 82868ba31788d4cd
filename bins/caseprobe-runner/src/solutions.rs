//! Bundled Solutions
//!
//! Routines linked into the `caseprobe` binary. The first CLI argument names
//! one of them by file stem, so `solutions/divide.rs`, `divide.py` and
//! `divide` all select `divide`.

use std::path::Path;
use std::sync::Arc;

use caseprobe_common::solution::{FnSolution, Solution, SolutionError, SolutionResult};
use caseprobe_common::types::InputVector;
use serde_json::{json, Value};

/// Name-addressable set of solutions, kept in registration order
#[derive(Default)]
pub struct SolutionRegistry {
    solutions: Vec<Arc<dyn Solution>>,
}

impl SolutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every bundled solution
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(FnSolution::new("sum", sum)))
            .register(Arc::new(FnSolution::new("divide", divide)))
            .register(Arc::new(FnSolution::new("echo", echo)))
            .register(Arc::new(FnSolution::new("lookup", lookup)))
            .register(Arc::new(FnSolution::new("parse", parse)))
            .register(Arc::new(FnSolution::new("triangle", triangle)));
        registry
    }

    /// Add a solution, replacing any existing one with the same name
    pub fn register(&mut self, solution: Arc<dyn Solution>) -> &mut Self {
        match self
            .solutions
            .iter_mut()
            .find(|existing| existing.name() == solution.name())
        {
            Some(slot) => *slot = solution,
            None => self.solutions.push(solution),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Solution>> {
        self.solutions
            .iter()
            .find(|solution| solution.name() == name)
            .cloned()
    }

    /// Look up a solution by the file stem of `identifier`
    pub fn resolve(&self, identifier: &Path) -> Option<Arc<dyn Solution>> {
        let stem = identifier.file_stem()?.to_str()?;
        self.get(stem)
    }

    pub fn names(&self) -> Vec<&str> {
        self.solutions.iter().map(|solution| solution.name()).collect()
    }
}

/// Sum of all arguments. Integer when every argument is an integer.
fn sum(input: &InputVector) -> SolutionResult {
    if input.iter().all(|value| value.is_i64()) {
        let mut total: i64 = 0;
        for index in 0..input.len() {
            total = total
                .checked_add(input.i64_at(index)?)
                .ok_or_else(|| SolutionError::new("integer overflow"))?;
        }
        return Ok(json!(total));
    }

    let mut total = 0.0;
    for index in 0..input.len() {
        total += input.f64_at(index)?;
    }
    Ok(json!(total))
}

/// Integer division of the first argument by the second
fn divide(input: &InputVector) -> SolutionResult {
    let dividend = input.i64_at(0)?;
    let divisor = input.i64_at(1)?;

    if divisor == 0 {
        return Err(SolutionError::new("division by zero"));
    }

    dividend
        .checked_div(divisor)
        .map(|quotient| json!(quotient))
        .ok_or_else(|| SolutionError::new("integer overflow"))
}

/// Prints each argument on its own line and returns how many there were
fn echo(input: &InputVector) -> SolutionResult {
    for value in input {
        match value {
            Value::String(text) => println!("{}", text),
            other => println!("{}", other),
        }
    }
    Ok(json!(input.len()))
}

/// Element of a list (first argument) at a position (second argument).
///
/// Indexes without a bounds check; an out-of-range position panics.
fn lookup(input: &InputVector) -> SolutionResult {
    let items = input
        .value_at(0)?
        .as_array()
        .ok_or(SolutionError::InvalidArgument {
            index: 0,
            expected: "an array",
        })?;
    let position = input.i64_at(1)?;

    println!("looking up position {} of {}", position, items.len());
    Ok(items[position as usize].clone())
}

/// Parses the first argument as a base-10 integer, announcing the attempt
fn parse(input: &InputVector) -> SolutionResult {
    let text = input.str_at(0)?;
    println!("parsing {:?}", text);

    text.trim()
        .parse::<i64>()
        .map(|value| json!(value))
        .map_err(|e| SolutionError::new(format!("cannot parse {:?}: {}", text, e)))
}

/// n-th triangular number, computed recursively; recursion depth is n
fn triangle(input: &InputVector) -> SolutionResult {
    let n = input.i64_at(0)?;
    if n < 0 {
        return Err(SolutionError::new("n must be non-negative"));
    }
    Ok(json!(triangle_rec(n as u64)))
}

fn triangle_rec(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    n + triangle_rec(n - 1)
}
