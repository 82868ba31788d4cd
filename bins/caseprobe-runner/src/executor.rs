//! Batch Executor - High-Level Orchestration
//!
//! **Responsibility:**
//! Load a test-case document, run every case through the engine in document
//! order, and hand each measurement to the report assembler.
//!
//! This module is the glue layer - it knows nothing about:
//! - How a case is measured (engine's job)
//! - How report records are shaped (report's job)

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use caseprobe_common::types::{AggregateReport, InputVector, TestSuite};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::CaseExecutor;
use crate::report::{ReportAssembler, ReportOptions};

/// Read and parse a test-case document
pub fn load_suite(path: &Path) -> Result<TestSuite> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to open testcase file: {}", path.display()))?;

    let suite = TestSuite::from_json_str(&content)
        .with_context(|| format!("Failed to parse testcase file: {}", path.display()))?;

    debug!(path = %path.display(), cases = suite.len(), "Loaded test suite");
    Ok(suite)
}

/// Run every case of `suite` and collect the aggregate report
///
/// Cases without an `input` field get no record. Their diagnostic goes
/// straight to stderr, independent of the log filter. A failing case never stops the batch.
#[tracing::instrument(
    skip_all,
    fields(
        run_id = %Uuid::new_v4(),
        solution = %engine.solution_name(),
        case_count = suite.len()
    )
)]
pub async fn run_batch(
    engine: &CaseExecutor,
    suite: TestSuite,
    options: ReportOptions,
) -> AggregateReport {
    info!("Starting batch");

    let mut assembler = ReportAssembler::new(options);

    for case in suite.cases {
        let Some(input) = case.input else {
            eprintln!("Test case {} does not contain 'input' field", case.key);
            debug!(case = %case.key, "Skipping case without input");
            assembler.skip(&case.key);
            continue;
        };

        let execution = engine
            .execute(&case.key, InputVector::from_input(input))
            .await;
        assembler.record(&case.key, execution);
    }

    let summary = assembler.summary();
    info!(
        executed = summary.executed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "Batch completed"
    );

    assembler.finish()
}

/// Load `testcase_path` and run it through `engine`
pub async fn run_file(
    engine: &CaseExecutor,
    testcase_path: &Path,
    options: ReportOptions,
) -> Result<AggregateReport> {
    let suite = load_suite(testcase_path)?;
    Ok(run_batch(engine, suite, options).await)
}
