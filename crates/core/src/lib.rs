//! Department order statistics.
//!
//! The batch runs in four strict stages: resolve the products header, index
//! the catalog, aggregate the order lines against it, then sort and emit one
//! report row per department.

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod report;
pub mod sample;

pub use aggregate::{DepartmentStats, OrderAggregator, OrderSummary, OrderTotals, ReorderFlag};
pub use catalog::{Catalog, CatalogIndexer};
pub use error::PipelineError;
pub use header::{resolve_columns, ColumnMap, ResolvedColumns};
pub use pipeline::{run_pipeline, PipelineOutcome, StageObserver};
pub use report::{build_report, render_report, write_report, ReportRow, REPORT_HEADER};
pub use sample::{sample_file, SampleError};
