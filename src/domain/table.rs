use serde::{Deserialize, Serialize};

use crate::domain::row::{round_to, PageRow, QueryRow};

/// Named column of a report table, in the order it is written to a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Page,
    Query,
    Clicks,
    Impressions,
    Ctr,
    Position,
    ExistsOnSite,
    WordCount,
    Title,
}

impl Column {
    /// Columns of a freshly fetched query-dimension report
    pub const QUERY_REPORT: [Column; 5] = [
        Column::Query,
        Column::Clicks,
        Column::Impressions,
        Column::Ctr,
        Column::Position,
    ];

    /// Columns of a page-dimension report
    pub const PAGE_REPORT: [Column; 5] = [
        Column::Page,
        Column::Clicks,
        Column::Impressions,
        Column::Ctr,
        Column::Position,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Page => "page",
            Column::Query => "query",
            Column::Clicks => "clicks",
            Column::Impressions => "impressions",
            Column::Ctr => "ctr",
            Column::Position => "position",
            Column::ExistsOnSite => "exists_on_site",
            Column::WordCount => "word_count",
            Column::Title => "title",
        }
    }
}

/// A single value read out of a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
    Empty,
}

impl<'a> Cell<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Cell::Text(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Row/column access used by the bucketizer and the report writer.
pub trait Table {
    /// Visible columns, in output order
    fn columns(&self) -> &[Column];

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row` for `column`; [`Cell::Empty`] when the row has no value
    fn cell(&self, row: usize, column: Column) -> Cell<'_>;

    /// New table holding only the given rows, in the given order
    fn select(&self, rows: &[usize]) -> Self
    where
        Self: Sized;
}

/// Query-level report table.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTable {
    columns: Vec<Column>,
    rows: Vec<QueryRow>,
}

impl Default for QueryTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl QueryTable {
    pub fn new(rows: Vec<QueryRow>) -> Self {
        Self {
            columns: Column::QUERY_REPORT.to_vec(),
            rows,
        }
    }

    pub fn rows(&self) -> &[QueryRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [QueryRow] {
        &mut self.rows
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Append a column unless it is already present
    pub fn add_column(&mut self, column: Column) {
        if !self.has_column(column) {
            self.columns.push(column);
        }
    }

    /// Insert a column at `index`, moving it there if already present
    pub fn insert_column(&mut self, index: usize, column: Column) {
        self.columns.retain(|c| *c != column);
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
    }

    /// Hide a column from output; row data is left untouched
    pub fn drop_column(&mut self, column: Column) {
        self.columns.retain(|c| *c != column);
    }

    /// Stable sort, highest impressions first
    pub fn sort_by_impressions(&mut self) {
        self.rows.sort_by(|a, b| b.impressions.cmp(&a.impressions));
    }

    pub fn round(&mut self, decimals: u32) {
        for row in &mut self.rows {
            row.ctr = round_to(row.ctr, decimals);
            row.position = round_to(row.position, decimals);
        }
    }

    /// Set `page` on every row and make it the first column
    pub fn attach_page(&mut self, page: &str) {
        for row in &mut self.rows {
            row.page = Some(page.to_string());
        }
        self.insert_column(0, Column::Page);
    }

    /// Stack tables on top of each other.
    ///
    /// Columns are the union of all inputs in first-seen order; rows that
    /// lack a value for a column read back as [`Cell::Empty`].
    pub fn concat(tables: impl IntoIterator<Item = QueryTable>) -> Self {
        let mut columns: Vec<Column> = Vec::new();
        let mut rows = Vec::new();

        for table in tables {
            for column in table.columns {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
            rows.extend(table.rows);
        }

        if columns.is_empty() {
            columns = Column::QUERY_REPORT.to_vec();
        }

        Self { columns, rows }
    }
}

impl Table for QueryTable {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, column: Column) -> Cell<'_> {
        let Some(row) = self.rows.get(row) else {
            return Cell::Empty;
        };

        match column {
            Column::Page => row.page.as_deref().map_or(Cell::Empty, Cell::Text),
            Column::Query => Cell::Text(&row.query),
            Column::Clicks => Cell::Int(row.clicks),
            Column::Impressions => Cell::Int(row.impressions),
            Column::Ctr => Cell::Float(row.ctr),
            Column::Position => Cell::Float(row.position),
            Column::ExistsOnSite => row.exists_on_site.map_or(Cell::Empty, Cell::Int),
            Column::WordCount => row.word_count.map_or(Cell::Empty, Cell::Int),
            Column::Title => row.title.as_deref().map_or(Cell::Empty, Cell::Text),
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: rows
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// Page-level report table, used for the page list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageTable {
    rows: Vec<PageRow>,
}

impl PageTable {
    pub fn new(rows: Vec<PageRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PageRow] {
        &self.rows
    }

    /// Page URLs in table order
    pub fn pages(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.page.clone()).collect()
    }

    pub fn sort_by_impressions(&mut self) {
        self.rows.sort_by(|a, b| b.impressions.cmp(&a.impressions));
    }

    pub fn round(&mut self, decimals: u32) {
        for row in &mut self.rows {
            row.ctr = round_to(row.ctr, decimals);
            row.position = round_to(row.position, decimals);
        }
    }
}

impl Table for PageTable {
    fn columns(&self) -> &[Column] {
        &Column::PAGE_REPORT
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, column: Column) -> Cell<'_> {
        let Some(row) = self.rows.get(row) else {
            return Cell::Empty;
        };

        match column {
            Column::Page => Cell::Text(&row.page),
            Column::Clicks => Cell::Int(row.clicks),
            Column::Impressions => Cell::Int(row.impressions),
            Column::Ctr => Cell::Float(row.ctr),
            Column::Position => Cell::Float(row.position),
            _ => Cell::Empty,
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self {
            rows: rows
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryTable {
        QueryTable::new(vec![
            QueryRow::new("low", 0, 5, 0.0, 12.0),
            QueryRow::new("high", 3, 50, 0.06, 4.0),
            QueryRow::new("mid", 1, 20, 0.05, 8.0),
        ])
    }

    #[test]
    fn test_sort_by_impressions_descending() {
        let mut table = sample();
        table.sort_by_impressions();
        let queries: Vec<_> = table.rows().iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_attach_page_becomes_first_column() {
        let mut table = sample();
        table.attach_page("https://example.com/a");
        assert_eq!(table.columns()[0], Column::Page);
        assert_eq!(table.cell(0, Column::Page), Cell::Text("https://example.com/a"));
    }

    #[test]
    fn test_missing_derived_value_is_empty_cell() {
        let table = sample();
        assert_eq!(table.cell(0, Column::ExistsOnSite), Cell::Empty);
        assert_eq!(table.cell(99, Column::Query), Cell::Empty);
    }

    #[test]
    fn test_select_keeps_columns_and_order() {
        let mut table = sample();
        table.drop_column(Column::Ctr);
        let subset = table.select(&[2, 0]);
        assert_eq!(subset.columns(), table.columns());
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.cell(0, Column::Query), Cell::Text("mid"));
        assert_eq!(subset.cell(1, Column::Query), Cell::Text("low"));
    }

    #[test]
    fn test_concat_unions_columns_in_first_seen_order() {
        let mut enriched = QueryTable::new(vec![QueryRow::new("a", 0, 1, 0.0, 1.0)]);
        enriched.attach_page("https://example.com/a");
        enriched.add_column(Column::ExistsOnSite);

        let mut plain = QueryTable::new(vec![QueryRow::new("b", 0, 2, 0.0, 1.0)]);
        plain.attach_page("https://example.com/b");

        let merged = QueryTable::concat(vec![plain, enriched]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.columns().first(), Some(&Column::Page));
        assert_eq!(merged.columns().last(), Some(&Column::ExistsOnSite));
        assert_eq!(merged.cell(0, Column::ExistsOnSite), Cell::Empty);
    }

    #[test]
    fn test_concat_of_nothing_has_query_columns() {
        let merged = QueryTable::concat(Vec::new());
        assert!(merged.is_empty());
        assert_eq!(merged.columns(), &Column::QUERY_REPORT);
    }

    #[test]
    fn test_page_table_pages_in_order() {
        let mut table = PageTable::new(vec![
            PageRow {
                page: "https://example.com/b".into(),
                impressions: 5,
                ..Default::default()
            },
            PageRow {
                page: "https://example.com/a".into(),
                impressions: 9,
                ..Default::default()
            },
        ]);
        table.sort_by_impressions();
        assert_eq!(
            table.pages(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
