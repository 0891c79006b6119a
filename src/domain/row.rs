use serde::{Deserialize, Serialize};

/// One query line of a search performance report.
///
/// `page` is set on per-page reports; `exists_on_site`, `word_count` and
/// `title` are only present after enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    pub page: Option<String>,
    pub query: String,
    pub clicks: i64,
    pub impressions: i64,
    pub ctr: f64,
    pub position: f64,
    pub exists_on_site: Option<i64>,
    pub word_count: Option<i64>,
    pub title: Option<String>,
}

impl QueryRow {
    pub fn new(query: impl Into<String>, clicks: i64, impressions: i64, ctr: f64, position: f64) -> Self {
        Self {
            query: query.into(),
            clicks,
            impressions,
            ctr,
            position,
            ..Default::default()
        }
    }
}

/// One line of the pages report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRow {
    pub page: String,
    pub clicks: i64,
    pub impressions: i64,
    pub ctr: f64,
    pub position: f64,
}

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_one_decimal() {
        assert_eq!(round_to(4.26, 1), 4.3);
        assert_eq!(round_to(10.04, 1), 10.0);
    }

    #[test]
    fn test_round_to_zero_decimals() {
        assert_eq!(round_to(0.0432, 0), 0.0);
        assert_eq!(round_to(12.5, 0), 12.0);
        assert_eq!(round_to(13.5, 0), 14.0);
    }

    #[test]
    fn test_half_position_keeps_range_overlap() {
        // 10.5 must stay on the shared 5-10 / 10-20 boundary
        assert_eq!(round_to(10.5, 0), 10.0);
        assert_eq!(round_to(11.5, 0), 12.0);
    }

    #[test]
    fn test_new_row_has_no_derived_fields() {
        let row = QueryRow::new("rust", 1, 10, 0.1, 3.2);
        assert!(row.page.is_none());
        assert!(row.exists_on_site.is_none());
        assert!(row.word_count.is_none());
        assert!(row.title.is_none());
    }
}
