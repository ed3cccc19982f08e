use std::{
    collections::{HashMap, HashSet},
    io::Read,
};

use csv::{Reader, StringRecord};

use crate::{error::PipelineError, header::ColumnMap};

pub const PRODUCT_ID_COLUMN: &str = "product_id";
pub const DEPARTMENT_ID_COLUMN: &str = "department_id";

/// Product to department membership index.
///
/// Identifiers are stored lowercased. A product appears once and always has
/// at least one department.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: HashMap<String, HashSet<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `department_id` to the department set of `product_id`.
    pub fn insert(&mut self, product_id: &str, department_id: &str) {
        self.products
            .entry(product_id.to_lowercase())
            .or_default()
            .insert(department_id.to_lowercase());
    }

    /// Departments of a product. `product_id` must already be lowercased.
    pub fn departments(&self, product_id: &str) -> Option<&HashSet<String>> {
        self.products.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Builds a [`Catalog`] from a products reader positioned after its header.
pub struct CatalogIndexer;

impl CatalogIndexer {
    /// Consumes every remaining row and returns the catalog with the number of rows read.
    pub fn index<R: Read>(
        reader: &mut Reader<R>,
        columns: &ColumnMap,
    ) -> Result<(Catalog, u64), PipelineError> {
        let product_idx = columns.position(PRODUCT_ID_COLUMN)?;
        let department_idx = columns.position(DEPARTMENT_ID_COLUMN)?;

        let mut catalog = Catalog::new();
        let mut rows = 0u64;
        let mut record = StringRecord::new();

        while reader
            .read_record(&mut record)
            .map_err(|err| PipelineError::csv(columns.file(), err))?
        {
            let product_id = columns.field(&record, product_idx)?;
            let department_id = columns.field(&record, department_idx)?;
            catalog.insert(product_id, department_id);
            rows += 1;
        }

        Ok((catalog, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::resolve_columns;
    use csv::ReaderBuilder;

    fn index(input: &str) -> Result<(Catalog, u64), PipelineError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(input.as_bytes());
        let header = reader.headers().expect("header row").clone();
        let columns = resolve_columns(
            "products",
            &header,
            &[PRODUCT_ID_COLUMN, DEPARTMENT_ID_COLUMN],
        )
        .require()?;
        CatalogIndexer::index(&mut reader, &columns)
    }

    #[test]
    fn groups_departments_per_product() {
        let (catalog, rows) =
            index("product_id,department_id\n5,1\n5,2\n5,1\n6,3\n").expect("index catalog");

        assert_eq!(rows, 4);
        assert_eq!(catalog.len(), 2);
        let five = catalog.departments("5").expect("product 5 indexed");
        assert_eq!(five.len(), 2);
        assert!(five.contains("1") && five.contains("2"));
    }

    #[test]
    fn lowercases_identifiers_and_honours_column_order() {
        let (catalog, _) =
            index("Name,DEPARTMENT_ID,Product_Id\nMilk,Dairy,ABC\n").expect("index catalog");

        let departments = catalog.departments("abc").expect("lowercased key");
        assert!(departments.contains("dairy"));
        assert!(catalog.departments("ABC").is_none());
    }

    #[test]
    fn header_only_file_yields_zero_rows() {
        let (catalog, rows) = index("product_id,department_id\n").expect("index catalog");

        assert_eq!(rows, 0);
        assert!(catalog.is_empty());
    }

    #[test]
    fn quoted_cells_are_unwrapped() {
        let (catalog, _) =
            index("product_id,department_id\n\"7\",\"1,2\"\n").expect("index catalog");

        assert!(catalog.departments("7").expect("product 7").contains("1,2"));
    }

    #[test]
    fn short_row_is_rejected() {
        let err = index("product_id,department_id\n7\n").expect_err("row lacks department");

        assert!(matches!(
            err,
            PipelineError::MissingField { line: 2, ref column, .. } if column == DEPARTMENT_ID_COLUMN
        ));
    }
}
