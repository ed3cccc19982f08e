use std::{collections::HashMap, io::Read};

use csv::{Reader, StringRecord};

use crate::{
    catalog::{Catalog, PRODUCT_ID_COLUMN},
    error::PipelineError,
    header::ColumnMap,
};

pub const REORDERED_COLUMN: &str = "reordered";

/// Order counters for a single department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTotals {
    pub total_orders: u64,
    pub first_time_orders: u64,
}

impl OrderTotals {
    fn record(&mut self, flag: ReorderFlag) {
        self.total_orders += 1;
        if flag == ReorderFlag::FirstTime {
            self.first_time_orders += 1;
        }
    }
}

/// Per-department counters keyed by lowercased department id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentStats {
    departments: HashMap<String, OrderTotals>,
}

impl DepartmentStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one order line against `department_id`, creating it at (0, 0) on first use.
    pub fn record(&mut self, department_id: &str, flag: ReorderFlag) {
        match self.departments.get_mut(department_id) {
            Some(totals) => totals.record(flag),
            None => {
                let mut totals = OrderTotals::default();
                totals.record(flag);
                self.departments.insert(department_id.to_string(), totals);
            }
        }
    }

    pub fn get(&self, department_id: &str) -> Option<&OrderTotals> {
        self.departments.get(department_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OrderTotals)> {
        self.departments
            .iter()
            .map(|(department, totals)| (department.as_str(), totals))
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}

/// Reorder indicator of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderFlag {
    FirstTime,
    Reorder,
}

impl ReorderFlag {
    /// Strict unsigned integer parse: `0` (or `00`) is a first-time order, any
    /// other integer a reorder. Whitespace and non-digits are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.parse::<u64>() {
            Ok(0) => Some(Self::FirstTime),
            Ok(_) => Some(Self::Reorder),
            Err(_) => None,
        }
    }
}

/// Row counts gathered while streaming the orders file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderSummary {
    pub rows_read: u64,
    pub rows_accepted: u64,
    pub rows_skipped: u64,
}

/// Streams order lines against a complete [`Catalog`].
pub struct OrderAggregator<'c> {
    catalog: &'c Catalog,
}

impl<'c> OrderAggregator<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Consumes every remaining row of `reader` (positioned after its header).
    ///
    /// Lines naming a product missing from the catalog are skipped. A product
    /// that belongs to several departments counts once for each of them.
    pub fn aggregate<R: Read>(
        &self,
        reader: &mut Reader<R>,
        columns: &ColumnMap,
    ) -> Result<(DepartmentStats, OrderSummary), PipelineError> {
        let product_idx = columns.position(PRODUCT_ID_COLUMN)?;
        let reordered_idx = columns.position(REORDERED_COLUMN)?;

        let mut stats = DepartmentStats::new();
        let mut summary = OrderSummary::default();
        let mut record = StringRecord::new();

        while reader
            .read_record(&mut record)
            .map_err(|err| PipelineError::csv(columns.file(), err))?
        {
            summary.rows_read += 1;

            let product_id = columns.field(&record, product_idx)?.to_lowercase();
            let Some(departments) = self.catalog.departments(&product_id) else {
                summary.rows_skipped += 1;
                continue;
            };

            let raw_flag = columns.field(&record, reordered_idx)?;
            let flag =
                ReorderFlag::parse(raw_flag).ok_or_else(|| PipelineError::InvalidReorderFlag {
                    line: record.position().map(|pos| pos.line()).unwrap_or_default(),
                    value: raw_flag.to_string(),
                })?;

            for department in departments {
                stats.record(department, flag);
            }
            summary.rows_accepted += 1;
        }

        Ok((stats, summary))
    }
}
