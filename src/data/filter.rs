use super::model::{PartialRow, Row};

// ---------------------------------------------------------------------------
// Missing-value filter
// ---------------------------------------------------------------------------

/// A cell counts as present when it holds a value that is not NaN.
fn is_present(cell: &Option<f64>) -> bool {
    matches!(cell, Some(v) if !v.is_nan())
}

/// Whether every channel of the row is present.
pub fn is_complete(row: &PartialRow) -> bool {
    row.iter().all(is_present)
}

/// Keep only complete rows, preserving their order.
pub fn drop_incomplete(rows: Vec<PartialRow>) -> Vec<Row> {
    rows.into_iter()
        .filter(is_complete)
        .map(|row| row.map(Option::unwrap_or_default))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_rows_pass_through_unchanged() {
        let rows = vec![
            [Some(1.0), Some(2.0), Some(3.0)],
            [Some(4.0), Some(5.0), Some(6.0)],
        ];
        assert_eq!(drop_incomplete(rows), vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn rows_with_null_or_nan_are_dropped() {
        let rows = vec![
            [Some(1.0), None, Some(3.0)],
            [Some(4.0), Some(5.0), Some(6.0)],
            [Some(f64::NAN), Some(8.0), Some(9.0)],
            [Some(7.0), Some(8.0), Some(9.0)],
        ];
        assert!(!is_complete(&rows[0]));
        assert!(!is_complete(&rows[2]));
        assert_eq!(drop_incomplete(rows), vec![[4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
    }
}
