//! Search query construction from weighted ICP rows
//!
//! Pure function: rows are grouped by attribute (first-seen order), rows with
//! weight <= 0 are dropped, remaining values are sorted by weight descending
//! (stable on ties), quoted, OR-joined within a group, and the groups are
//! AND-joined. An empty result means no usable ICP data and callers must
//! treat it as an error, not a valid search.

use crate::types::IcpRow;

/// Build the boolean search query string for a set of ICP rows.
pub fn build_search_query(rows: &[IcpRow]) -> String {
    // Group by attribute preserving first-seen attribute order.
    let mut groups: Vec<(&str, Vec<(&str, f64)>)> = Vec::new();

    for row in rows {
        let weight = row.weight_value();
        if weight <= 0.0 {
            continue;
        }

        match groups.iter_mut().find(|(attr, _)| *attr == row.attribute) {
            Some((_, values)) => values.push((row.value.as_str(), weight)),
            None => groups.push((row.attribute.as_str(), vec![(row.value.as_str(), weight)])),
        }
    }

    let mut parts = Vec::with_capacity(groups.len());
    for (_, mut values) in groups {
        // Stable sort keeps original order for equal weights.
        values.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let joined = values
            .iter()
            .map(|(value, _)| format!("\"{}\"", value))
            .collect::<Vec<_>>()
            .join(" OR ");
        parts.push(format!("({})", joined));
    }

    parts.join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, attribute: &str, value: &str, weight: &str) -> IcpRow {
        IcpRow::new(id, attribute, value, weight)
    }

    #[test]
    fn test_zero_weight_rows_are_excluded() {
        let rows = vec![
            row(1, "Industry", "SaaS", "1.00"),
            row(2, "Industry", "Legacy", "0"),
        ];

        let query = build_search_query(&rows);

        assert!(query.contains("\"SaaS\""));
        assert!(!query.contains("Legacy"));
    }

    #[test]
    fn test_groups_are_or_joined_and_attributes_and_joined() {
        let rows = vec![
            row(1, "Industry", "SaaS", "1"),
            row(2, "Region", "UK", "1"),
        ];

        assert_eq!(build_search_query(&rows), r#"("SaaS") AND ("UK")"#);
    }

    #[test]
    fn test_values_sorted_by_weight_descending() {
        let rows = vec![
            row(1, "Industry", "A", "0.5"),
            row(2, "Industry", "B", "0.9"),
        ];

        assert_eq!(build_search_query(&rows), r#"("B" OR "A")"#);
    }

    #[test]
    fn test_equal_weights_keep_original_order() {
        let rows = vec![
            row(1, "Industry", "First", "0.5"),
            row(2, "Industry", "Second", "0.5"),
            row(3, "Industry", "Third", "0.5"),
        ];

        assert_eq!(build_search_query(&rows), r#"("First" OR "Second" OR "Third")"#);
    }

    #[test]
    fn test_malformed_weight_counts_as_zero() {
        let rows = vec![
            row(1, "Industry", "Good", "0.8"),
            row(2, "Industry", "Bad", "not-a-number"),
        ];

        assert_eq!(build_search_query(&rows), r#"("Good")"#);
    }

    #[test]
    fn test_all_rows_excluded_yields_empty_string() {
        let rows = vec![
            row(1, "Industry", "A", "0"),
            row(2, "Region", "B", "-1"),
        ];

        assert_eq!(build_search_query(&rows), "");
    }

    #[test]
    fn test_determinism() {
        let rows = vec![
            row(1, "Industry", "SaaS", "1.0"),
            row(2, "Region", "UK", "0.7"),
            row(3, "Industry", "Fintech", "0.9"),
        ];

        let first = build_search_query(&rows);
        let second = build_search_query(&rows);

        assert_eq!(first, second);
        assert_eq!(first, r#"("SaaS" OR "Fintech") AND ("UK")"#);
    }
}
