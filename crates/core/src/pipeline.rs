use std::{fs::File, io::Read, path::Path};

use csv::{Reader, ReaderBuilder};

use crate::{
    aggregate::{DepartmentStats, OrderAggregator, OrderSummary, REORDERED_COLUMN},
    catalog::{Catalog, CatalogIndexer, DEPARTMENT_ID_COLUMN, PRODUCT_ID_COLUMN},
    error::PipelineError,
    header::{resolve_columns, ColumnMap},
    report::{build_report, ReportRow},
};

pub const PRODUCTS_FILE: &str = "products";
pub const ORDERS_FILE: &str = "orders";

const PRODUCT_COLUMNS: [&str; 2] = [PRODUCT_ID_COLUMN, DEPARTMENT_ID_COLUMN];
const ORDER_COLUMNS: [&str; 2] = [PRODUCT_ID_COLUMN, REORDERED_COLUMN];

/// Result of a completed run, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub catalog_rows: u64,
    pub catalog_products: usize,
    pub orders: OrderSummary,
    pub rows: Vec<ReportRow>,
}

/// Stage hooks, called once each stage has finished.
pub trait StageObserver {
    fn catalog_indexed(&mut self, _rows: u64, _products: usize) {}
    fn orders_aggregated(&mut self, _summary: &OrderSummary, _departments: usize) {}
}

impl StageObserver for () {}

/// Runs the whole batch: index products, aggregate orders, sort departments.
///
/// Each stage completes before the next starts. Nothing is written here; the
/// caller renders `rows` only after every stage has succeeded.
pub fn run_pipeline(
    products_path: &Path,
    orders_path: &Path,
    observer: &mut dyn StageObserver,
) -> Result<PipelineOutcome, PipelineError> {
    let (mut products, product_columns) =
        open_input(products_path, PRODUCTS_FILE, &PRODUCT_COLUMNS)?;
    let (catalog, catalog_rows) = CatalogIndexer::index(&mut products, &product_columns)?;
    drop(products);
    ensure_catalog(&catalog, catalog_rows)?;
    observer.catalog_indexed(catalog_rows, catalog.len());

    let (mut orders, order_columns) = open_input(orders_path, ORDERS_FILE, &ORDER_COLUMNS)?;
    let (stats, summary) = OrderAggregator::new(&catalog).aggregate(&mut orders, &order_columns)?;
    drop(orders);
    ensure_stats(&stats, &summary)?;
    observer.orders_aggregated(&summary, stats.len());

    let rows = build_report(&stats)?;

    Ok(PipelineOutcome {
        catalog_rows,
        catalog_products: catalog.len(),
        orders: summary,
        rows,
    })
}

/// Opens `path`, checks it can hold the required header and resolves its columns.
pub fn open_input(
    path: &Path,
    file: &str,
    required: &[&str],
) -> Result<(Reader<File>, ColumnMap), PipelineError> {
    let handle = File::open(path).map_err(|source| PipelineError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    // Pipes and devices report length 0; only regular files are size-checked.
    let metadata = handle
        .metadata()
        .map_err(|source| PipelineError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
    let minimal_header = required.join(",");
    if metadata.is_file() && metadata.len() < minimal_header.len() as u64 {
        return Err(PipelineError::InputTooSmall {
            path: path.to_path_buf(),
            size: metadata.len(),
            header: minimal_header,
        });
    }

    let mut reader = csv_reader(handle);
    let columns = read_columns(&mut reader, file, required)?;
    Ok((reader, columns))
}

/// CSV reader settings shared by both inputs.
pub fn csv_reader<R: Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .buffer_capacity(1 << 20)
        .from_reader(input)
}

fn read_columns<R: Read>(
    reader: &mut Reader<R>,
    file: &str,
    required: &[&str],
) -> Result<ColumnMap, PipelineError> {
    let header = reader
        .headers()
        .map_err(|err| PipelineError::csv(file, err))?
        .clone();
    if header.is_empty() {
        return Err(PipelineError::EmptyInput {
            file: file.to_string(),
            reason: "no header row",
        });
    }
    resolve_columns(file, &header, required).require()
}

fn ensure_catalog(catalog: &Catalog, rows: u64) -> Result<(), PipelineError> {
    if rows == 0 || catalog.is_empty() {
        return Err(PipelineError::EmptyInput {
            file: PRODUCTS_FILE.to_string(),
            reason: "no product rows after the header",
        });
    }
    Ok(())
}

fn ensure_stats(stats: &DepartmentStats, summary: &OrderSummary) -> Result<(), PipelineError> {
    if summary.rows_read == 0 {
        return Err(PipelineError::EmptyInput {
            file: ORDERS_FILE.to_string(),
            reason: "no order rows after the header",
        });
    }
    if summary.rows_accepted == 0 || stats.is_empty() {
        return Err(PipelineError::EmptyInput {
            file: ORDERS_FILE.to_string(),
            reason: "no order row references a known product",
        });
    }
    Ok(())
}
