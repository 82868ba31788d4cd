//! Report Assembler - Outcome to Record Mapping
//!
//! **Core Responsibility:**
//! Turn raw case executions into report records and collect them in input order.
//!
//! **Critical Properties:**
//! - Knows nothing about procfs, output capture, or the solution
//! - Pure mapping: (outcome, usage, stdout) → CaseReport
//!
//! **Record Rules:**
//! - Success: `result` = returned value, `stderr` = null
//! - Failure: `result` = null, `stderr` = failure message
//! - `stdout` is always a string, empty when nothing was written
//! - Skipped cases (no input) produce no record at all
//!
//! **Options:**
//! - `trim_output`: strip surrounding whitespace from stdout and stderr
//! - `realtime_precision`: round realtime to N decimal places

use caseprobe_common::types::{AggregateReport, CaseReport, ExecutionOutcome, ResourceUsage};

/// Raw measurement of a single case.
/// Produced by the engine, consumed by the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExecution {
    pub outcome: ExecutionOutcome,
    pub usage: ResourceUsage,
    pub stdout: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub trim_output: bool,
    pub realtime_precision: Option<u32>,
}

/// Counts for the end-of-batch log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

fn normalize_text(text: String, trim: bool) -> String {
    if trim {
        text.trim().to_string()
    } else {
        text
    }
}

fn round_realtime(seconds: f64, precision: Option<u32>) -> f64 {
    match precision {
        Some(digits) => {
            let factor = 10f64.powi(digits as i32);
            (seconds * factor).round() / factor
        }
        None => seconds,
    }
}

/// Build the report record for one case
///
/// ## Arguments
/// * `outcome` - Success value or failure message
/// * `usage` - Tick deltas, wall time and peak memory measured around the call
/// * `stdout` - Text the solution wrote while captured
/// * `options` - Output normalization options
pub fn assemble(
    outcome: ExecutionOutcome,
    usage: ResourceUsage,
    stdout: String,
    options: &ReportOptions,
) -> CaseReport {
    let (result, stderr) = match outcome {
        ExecutionOutcome::Success(value) => (Some(value), None),
        ExecutionOutcome::Failure(message) => {
            (None, Some(normalize_text(message, options.trim_output)))
        }
    };

    CaseReport {
        result,
        utime: usage.utime,
        stime: usage.stime,
        realtime: round_realtime(usage.realtime, options.realtime_precision),
        max_memory: usage.max_memory,
        stdout: normalize_text(stdout, options.trim_output),
        stderr,
    }
}

/// Collects per-case records into the ordered aggregate report
#[derive(Debug, Default)]
pub struct ReportAssembler {
    options: ReportOptions,
    report: AggregateReport,
    summary: BatchSummary,
}

impl ReportAssembler {
    pub fn new(options: ReportOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn record(&mut self, key: &str, execution: CaseExecution) {
        self.summary.executed += 1;
        if execution.outcome.is_success() {
            self.summary.succeeded += 1;
        } else {
            self.summary.failed += 1;
        }

        let record = assemble(
            execution.outcome,
            execution.usage,
            execution.stdout,
            &self.options,
        );
        self.report.insert(key, record);
    }

    /// Note a case that had no input; it gets no record
    pub fn skip(&mut self, _key: &str) {
        self.summary.skipped += 1;
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    pub fn finish(self) -> AggregateReport {
        self.report
    }
}

/// Assemble a whole batch at once. `None` marks a skipped case.
pub fn assemble_all<I>(executions: I, options: ReportOptions) -> AggregateReport
where
    I: IntoIterator<Item = (String, Option<CaseExecution>)>,
{
    let mut assembler = ReportAssembler::new(options);
    for (key, execution) in executions {
        match execution {
            Some(execution) => assembler.record(&key, execution),
            None => assembler.skip(&key),
        }
    }
    assembler.finish()
}
