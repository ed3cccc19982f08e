use std::{
    fs,
    io::{self, Write},
};

use metrics::{counter, gauge};
use thiserror::Error;
use tracing::{debug, error, info};

use dept_report_core::{
    pipeline::{ORDERS_FILE, PRODUCTS_FILE},
    render_report, run_pipeline, OrderSummary, PipelineError, PipelineOutcome, StageObserver,
};
use dept_report_util::{ReportConfig, ReportTarget};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to write report to {target}: {source}")]
    Emit {
        target: String,
        #[source]
        source: io::Error,
    },
}

/// Logs and counts each finished stage.
#[derive(Debug, Default)]
pub struct MetricsObserver;

impl StageObserver for MetricsObserver {
    fn catalog_indexed(&mut self, rows: u64, products: usize) {
        counter!("pipeline_rows_total", "file" => PRODUCTS_FILE, "outcome" => "indexed")
            .increment(rows);
        info!(stage = "catalog", rows, products, "catalog indexed");
    }

    fn orders_aggregated(&mut self, summary: &OrderSummary, departments: usize) {
        counter!("pipeline_rows_total", "file" => ORDERS_FILE, "outcome" => "accepted")
            .increment(summary.rows_accepted);
        counter!("pipeline_rows_total", "file" => ORDERS_FILE, "outcome" => "skipped")
            .increment(summary.rows_skipped);
        if summary.rows_skipped > 0 {
            debug!(
                stage = "orders",
                skipped = summary.rows_skipped,
                "order lines for unknown products skipped"
            );
        }
        info!(
            stage = "orders",
            rows = summary.rows_read,
            accepted = summary.rows_accepted,
            departments,
            "orders aggregated"
        );
    }
}

/// Runs the department report described by `config`.
///
/// The report is rendered in memory and only written once every stage has
/// succeeded, so a failed run leaves an existing report untouched.
pub fn run_report(config: &ReportConfig) -> Result<PipelineOutcome, BatchError> {
    info!(
        stage = "config",
        products = %config.products_file.display(),
        orders = %config.orders_file.display(),
        report_to = %config.report_to,
        "starting department report"
    );

    let result = build_and_emit(config);
    if let Err(err) = &result {
        error!(stage = "report", error = %err, "department report failed");
    }
    result
}

fn build_and_emit(config: &ReportConfig) -> Result<PipelineOutcome, BatchError> {
    let outcome = run_pipeline(
        &config.products_file,
        &config.orders_file,
        &mut MetricsObserver,
    )?;
    let rendered = render_report(&outcome.rows)?;

    emit_report(&config.report_to, &rendered).map_err(|source| BatchError::Emit {
        target: config.report_to.to_string(),
        source,
    })?;

    gauge!("report_departments").set(outcome.rows.len() as f64);
    info!(
        stage = "report",
        departments = outcome.rows.len(),
        target = %config.report_to,
        "report written"
    );
    Ok(outcome)
}

/// Writes an already rendered report to its destination.
pub fn emit_report(target: &ReportTarget, rendered: &[u8]) -> io::Result<()> {
    match target {
        ReportTarget::Stdout => write_rendered(io::stdout().lock(), rendered),
        ReportTarget::File(path) => fs::write(path, rendered),
    }
}

/// Copies the rendered report into `out` and flushes it.
pub fn write_rendered<W: Write>(mut out: W, rendered: &[u8]) -> io::Result<()> {
    out.write_all(rendered)?;
    out.flush()
}
