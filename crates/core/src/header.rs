use csv::StringRecord;

use crate::error::PipelineError;

/// Column positions found in a header row, before validation.
///
/// A required name that does not appear in the header stays `None` until
/// [`ResolvedColumns::require`] turns it into [`PipelineError::MissingColumn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    file: String,
    entries: Vec<(String, Option<usize>)>,
}

/// Validated column positions. Every required name has an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    file: String,
    entries: Vec<(String, usize)>,
}

/// Maps each required column name to its zero-based position in `header`.
///
/// Matching ignores case. When a name occurs more than once the right-most
/// occurrence wins.
pub fn resolve_columns(file: &str, header: &StringRecord, required: &[&str]) -> ResolvedColumns {
    let mut entries: Vec<(String, Option<usize>)> = required
        .iter()
        .map(|name| (name.to_lowercase(), None))
        .collect();

    for (position, cell) in header.iter().enumerate() {
        let cell = cell.to_lowercase();
        for (name, index) in entries.iter_mut() {
            if *name == cell {
                *index = Some(position);
            }
        }
    }

    ResolvedColumns {
        file: file.to_string(),
        entries,
    }
}

impl ResolvedColumns {
    /// Returns the resolved position for `name`, if any.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .and_then(|(_, index)| *index)
    }

    /// Fails on the first required column that the header did not contain.
    pub fn require(self) -> Result<ColumnMap, PipelineError> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (name, index) in self.entries {
            match index {
                Some(index) => entries.push((name, index)),
                None => {
                    return Err(PipelineError::MissingColumn {
                        file: self.file,
                        column: name,
                    })
                }
            }
        }

        Ok(ColumnMap {
            file: self.file,
            entries,
        })
    }
}

impl ColumnMap {
    /// Name of the input this header belongs to, used in error messages.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Position of a column that was part of the required set.
    pub fn position(&self, name: &str) -> Result<usize, PipelineError> {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, index)| *index)
            .ok_or(PipelineError::MissingColumn {
                file: self.file.clone(),
                column: name,
            })
    }

    /// Reads the cell at `index` from `record`.
    pub(crate) fn field<'r>(
        &self,
        record: &'r StringRecord,
        index: usize,
    ) -> Result<&'r str, PipelineError> {
        record.get(index).ok_or_else(|| PipelineError::MissingField {
            file: self.file.clone(),
            line: record.position().map(|pos| pos.line()).unwrap_or_default(),
            column: self
                .entries
                .iter()
                .find(|(_, position)| *position == index)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| index.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn resolves_positions_ignoring_case() {
        let resolved = resolve_columns(
            "products",
            &header(&["Department_ID", "name", "PRODUCT_ID"]),
            &["product_id", "department_id"],
        );

        assert_eq!(resolved.index_of("product_id"), Some(2));
        assert_eq!(resolved.index_of("department_id"), Some(0));
    }

    #[test]
    fn right_most_duplicate_wins() {
        let resolved = resolve_columns(
            "orders",
            &header(&["product_id", "reordered", "product_id"]),
            &["product_id", "reordered"],
        );

        assert_eq!(resolved.index_of("product_id"), Some(2));
    }

    #[test]
    fn absent_column_is_unresolved_until_required() {
        let resolved = resolve_columns(
            "orders",
            &header(&["product_id", "order_id"]),
            &["product_id", "reordered"],
        );
        assert_eq!(resolved.index_of("reordered"), None);

        let err = resolved.require().expect_err("missing column must fail");
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref file, ref column } if file == "orders" && column == "reordered"
        ));
    }

    #[test]
    fn required_map_exposes_positions() {
        let columns = resolve_columns(
            "products",
            &header(&["product_id", "department_id"]),
            &["product_id", "department_id"],
        )
        .require()
        .expect("all columns present");

        assert_eq!(columns.position("department_id").expect("known"), 1);
        assert!(columns.position("aisle_id").is_err());
    }

    #[test]
    fn short_row_reports_missing_field() {
        let columns = resolve_columns("products", &header(&["a", "b"]), &["b"])
            .require()
            .expect("column b present");
        let record = StringRecord::from(vec!["only-one"]);

        let err = columns.field(&record, 1).expect_err("row too short");
        assert!(matches!(err, PipelineError::MissingField { ref column, .. } if column == "b"));
    }
}
