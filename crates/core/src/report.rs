use std::io::Write;

use serde::Serialize;

use crate::{aggregate::DepartmentStats, error::PipelineError};

pub const REPORT_HEADER: [&str; 4] = [
    "department_id",
    "number_of_orders",
    "number_of_first_orders",
    "percentage",
];

/// One line of the department report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub department_id: String,
    pub number_of_orders: u64,
    pub number_of_first_orders: u64,
    pub percentage: String,
}

impl ReportRow {
    fn new(department_id: &str, total_orders: u64, first_time_orders: u64) -> Self {
        let ratio = first_time_orders as f64 / total_orders as f64;
        Self {
            department_id: department_id.to_string(),
            number_of_orders: total_orders,
            number_of_first_orders: first_time_orders,
            percentage: format!("{ratio:.2}"),
        }
    }
}

/// Orders the aggregated departments by numeric id, ascending.
///
/// The sort key ignores surrounding whitespace; the id is emitted as read.
/// Ids that parse to the same integer (`4` and `04`) fall back to text order.
pub fn build_report(stats: &DepartmentStats) -> Result<Vec<ReportRow>, PipelineError> {
    let mut keyed = Vec::with_capacity(stats.len());
    for (department, totals) in stats.iter() {
        let numeric =
            department
                .trim()
                .parse::<i128>()
                .map_err(|_| PipelineError::NonNumericDepartment {
                    department: department.to_string(),
                })?;
        keyed.push((numeric, department, totals));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    Ok(keyed
        .into_iter()
        .map(|(_, department, totals)| {
            ReportRow::new(department, totals.total_orders, totals.first_time_orders)
        })
        .collect())
}

/// Writes the header and `rows` as comma separated lines terminated by `\n`.
pub fn write_report<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), PipelineError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer
        .write_record(REPORT_HEADER)
        .map_err(|err| PipelineError::csv("report", err))?;
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|err| PipelineError::csv("report", err))?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Renders the full report into memory.
pub fn render_report(rows: &[ReportRow]) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Vec::new();
    write_report(&mut buffer, rows)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ReorderFlag;

    fn stats(lines: &[(&str, ReorderFlag)]) -> DepartmentStats {
        let mut stats = DepartmentStats::new();
        for (department, flag) in lines {
            stats.record(department, *flag);
        }
        stats
    }

    #[test]
    fn sorts_numerically_not_lexically() {
        let stats = stats(&[
            ("10", ReorderFlag::Reorder),
            ("9", ReorderFlag::FirstTime),
            ("100", ReorderFlag::FirstTime),
            ("-1", ReorderFlag::Reorder),
        ]);

        let rows = build_report(&stats).expect("numeric ids");
        let ids: Vec<&str> = rows.iter().map(|row| row.department_id.as_str()).collect();
        assert_eq!(ids, vec!["-1", "9", "10", "100"]);
    }

    #[test]
    fn equal_numeric_ids_are_ordered_by_text() {
        let stats = stats(&[("4", ReorderFlag::Reorder), ("04", ReorderFlag::Reorder)]);

        let rows = build_report(&stats).expect("numeric ids");
        let ids: Vec<&str> = rows.iter().map(|row| row.department_id.as_str()).collect();
        assert_eq!(ids, vec!["04", "4"]);
    }

    #[test]
    fn percentage_has_two_decimals() {
        let stats = stats(&[
            ("1", ReorderFlag::FirstTime),
            ("1", ReorderFlag::Reorder),
            ("1", ReorderFlag::Reorder),
            ("2", ReorderFlag::Reorder),
            ("3", ReorderFlag::FirstTime),
        ]);

        let rows = build_report(&stats).expect("numeric ids");
        let percentages: Vec<&str> = rows.iter().map(|row| row.percentage.as_str()).collect();
        assert_eq!(percentages, vec!["0.33", "0.00", "1.00"]);
    }

    #[test]
    fn padded_and_wide_ids_sort_by_value() {
        let stats = stats(&[
            ("10", ReorderFlag::Reorder),
            (" 4", ReorderFlag::FirstTime),
            ("99999999999999999999", ReorderFlag::Reorder),
        ]);

        let rows = build_report(&stats).expect("numeric ids");
        let ids: Vec<&str> = rows.iter().map(|row| row.department_id.as_str()).collect();
        assert_eq!(ids, vec![" 4", "10", "99999999999999999999"]);
    }

    #[test]
    fn non_numeric_department_is_rejected() {
        let stats = stats(&[("dairy", ReorderFlag::Reorder)]);

        let err = build_report(&stats).expect_err("dairy is not numeric");
        assert!(matches!(
            err,
            PipelineError::NonNumericDepartment { ref department } if department == "dairy"
        ));
    }

    #[test]
    fn renders_header_and_rows() {
        let stats = stats(&[
            ("9", ReorderFlag::FirstTime),
            ("4", ReorderFlag::FirstTime),
            ("4", ReorderFlag::Reorder),
        ]);

        let rows = build_report(&stats).expect("numeric ids");
        let rendered = render_report(&rows).expect("render");
        assert_eq!(
            String::from_utf8(rendered).expect("utf8"),
            "department_id,number_of_orders,number_of_first_orders,percentage\n4,2,1,0.50\n9,1,1,1.00\n"
        );
    }

    #[test]
    fn empty_stats_render_header_only() {
        let rendered = render_report(&[]).expect("render");
        assert_eq!(
            rendered,
            b"department_id,number_of_orders,number_of_first_orders,percentage\n".to_vec()
        );
    }
}
