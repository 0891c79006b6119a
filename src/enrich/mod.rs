//! `exists_on_site` enrichment.
//!
//! Counts how often each query shows up in the content of its page: a title
//! hit adds one, and every non-overlapping body occurrence adds one more.
//! Matching is a substring scan over Unicode case-folded text (`ß` matches
//! `ss`), so a query inside a longer word still counts.

mod snapshot;

pub use snapshot::{find_latest_snapshot, SiteSnapshot};

use tracing::debug;

use crate::domain::{ArticleSnapshot, Column, QueryTable};

/// Full Unicode case folding
fn fold(text: &str) -> String {
    caseless::default_case_fold_str(text)
}

/// Non-overlapping occurrences of `needle` in `haystack`; both already folded.
fn count_folded(haystack: &str, needle: &str) -> i64 {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count() as i64
}

/// Score one query against an article.
pub fn exists_on_site(query: &str, article: &ArticleSnapshot) -> i64 {
    score(&fold(query), &fold(&article.title), &fold(&article.text))
}

fn score(query: &str, title: &str, text: &str) -> i64 {
    if query.is_empty() {
        return 0;
    }
    let in_title = i64::from(title.contains(query));
    in_title + count_folded(text, query)
}

/// Add `exists_on_site`, `word_count` and `title` to every row.
///
/// With no article the table comes back unchanged, without the derived
/// columns.
pub fn enrich(mut table: QueryTable, article: Option<&ArticleSnapshot>) -> QueryTable {
    let Some(article) = article else {
        return table;
    };

    let title = fold(&article.title);
    let text = fold(&article.text);
    let word_count = article.word_count as i64;

    for row in table.rows_mut() {
        row.exists_on_site = Some(score(&fold(&row.query), &title, &text));
        row.word_count = Some(word_count);
        row.title = Some(article.title.clone());
    }

    table.add_column(Column::ExistsOnSite);
    table.add_column(Column::WordCount);
    table.add_column(Column::Title);
    debug!(rows = table.rows().len(), "enriched from article");

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cell, QueryRow, Table};

    #[test]
    fn test_title_and_body_hits_add_up() {
        let article = ArticleSnapshot::new(
            "Hello World Guide",
            "Say hello world. Then HELLO WORLD again.",
        );
        assert_eq!(exists_on_site("hello world", &article), 3);
    }

    #[test]
    fn test_full_case_folding() {
        let article = ArticleSnapshot::new("", "Die Straße ist lang, die STRASSE auch");
        assert_eq!(exists_on_site("strasse", &article), 2);
        assert_eq!(exists_on_site("Straße", &article), 2);
    }

    #[test]
    fn test_title_counts_at_most_once() {
        let article = ArticleSnapshot::new("rust rust rust", "");
        assert_eq!(exists_on_site("rust", &article), 1);
    }

    #[test]
    fn test_substring_inside_longer_word_counts() {
        let article = ArticleSnapshot::new("", "Rustacean rusty trust");
        assert_eq!(exists_on_site("rust", &article), 3);
    }

    #[test]
    fn test_body_matches_do_not_overlap() {
        let article = ArticleSnapshot::new("", "aaaa");
        assert_eq!(exists_on_site("aa", &article), 2);
    }

    #[test]
    fn test_no_match_is_zero() {
        let article = ArticleSnapshot::new("Cooking", "Bread and butter");
        assert_eq!(exists_on_site("rust", &article), 0);
        assert_eq!(exists_on_site("", &article), 0);
    }

    #[test]
    fn test_enrich_adds_columns_in_order() {
        let table = QueryTable::new(vec![QueryRow::new("hello world", 1, 10, 0.1, 3.0)]);
        let article = ArticleSnapshot::new("Hello World Guide", "hello world and hello world");

        let enriched = enrich(table, Some(&article));
        let tail: Vec<_> = enriched.columns().iter().rev().take(3).rev().copied().collect();
        assert_eq!(tail, vec![Column::ExistsOnSite, Column::WordCount, Column::Title]);
        assert_eq!(enriched.cell(0, Column::ExistsOnSite), Cell::Int(3));
        assert_eq!(enriched.cell(0, Column::WordCount), Cell::Int(5));
        assert_eq!(enriched.cell(0, Column::Title), Cell::Text("Hello World Guide"));
    }

    #[test]
    fn test_enrich_without_article_is_noop() {
        let table = QueryTable::new(vec![QueryRow::new("hello", 1, 10, 0.1, 3.0)]);
        let result = enrich(table.clone(), None);
        assert_eq!(result, table);
        assert!(!result.has_column(Column::ExistsOnSite));
    }
}
