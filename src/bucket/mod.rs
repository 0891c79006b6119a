//! Splits a query table into named, overlapping views.
//!
//! Each view is an independent filter over the full input table, described
//! by a [`ViewSpec`]. The default spec list produces 13 views: everything,
//! then question, longtail (8+ and 12+ words) and unfiltered queries, each
//! cut into the 5-10, 10-20 and 20-100 position ranges.
//!
//! Range bounds are inclusive on both ends, so a row at position 10 lands
//! in both the 5-10 and the 10-20 views.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{Column, Table, ViewSet};

/// Interrogative/auxiliary openers followed by a space or a double quote.
/// Matched against the stored casing. `None` only if the pattern fails to
/// compile, which the unit tests rule out.
static QUESTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:who|what|where|when|why|how|was|did|do|is|are|aren't|won't|does|if|can|could|should|would|will|were|weren't|shouldn't|couldn't|cannot|can't|didn't|did not|doesn't|wouldn't)[" ]"#,
    )
    .ok()
});

/// Position ranges shared by every partition: (lower, upper, label)
pub const POSITION_RANGES: [(f64, f64, &str); 3] = [
    (5.0, 10.0, "5-10"),
    (10.0, 20.0, "10-20"),
    (20.0, 100.0, "20-100"),
];

/// Row filter over a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Every row
    Any,
    /// Query opens with a question word
    Question,
    /// Query has at least this many whitespace-separated words
    MinWords(usize),
    /// `lower <= position <= upper`
    PositionBetween { lower: f64, upper: f64 },
    /// All inner predicates hold
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn matches<T: Table>(&self, table: &T, row: usize) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::Question => query_of(table, row).is_some_and(is_question),
            Predicate::MinWords(words) => {
                query_of(table, row).is_some_and(|q| has_min_words(q, *words))
            }
            Predicate::PositionBetween { lower, upper } => table
                .cell(row, Column::Position)
                .as_f64()
                .is_some_and(|p| *lower <= p && p <= *upper),
            Predicate::And(inner) => inner.iter().all(|p| p.matches(table, row)),
        }
    }
}

fn query_of<T: Table>(table: &T, row: usize) -> Option<&str> {
    table.cell(row, Column::Query).as_text()
}

pub fn is_question(query: &str) -> bool {
    QUESTION.as_ref().is_some_and(|re| re.is_match(query))
}

/// True when some quote-free stretch of `query` holds at least `words - 1`
/// whitespace characters.
///
/// A double quote breaks the count, and runs of whitespace count once per
/// character, so `"a  b"` already has two separators.
pub fn has_min_words(query: &str, words: usize) -> bool {
    let separators = words.saturating_sub(1);
    if separators == 0 {
        return true;
    }

    query
        .split('"')
        .any(|stretch| stretch.chars().filter(|c| c.is_whitespace()).count() >= separators)
}

/// A named view and the predicate that selects its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub name: String,
    pub predicate: Predicate,
}

impl ViewSpec {
    pub fn new(name: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

/// The standard 13 views, in sheet order.
pub fn default_views() -> Vec<ViewSpec> {
    let mut specs = vec![ViewSpec::new("All Keywords", Predicate::Any)];

    let partitions: [(Predicate, fn(&str) -> String); 4] = [
        (Predicate::Question, |range| format!("Questions {range}")),
        (Predicate::MinWords(8), |range| format!("Longtails {range} 8+W")),
        (Predicate::MinWords(12), |range| format!("Longtails {range} 12+W")),
        (Predicate::Any, |range| format!("All Keywords {range}")),
    ];

    for (filter, name) in partitions {
        for (lower, upper, label) in POSITION_RANGES {
            let range = Predicate::PositionBetween { lower, upper };
            let predicate = match filter {
                Predicate::Any => range,
                ref other => Predicate::And(vec![other.clone(), range]),
            };
            specs.push(ViewSpec::new(name(label), predicate));
        }
    }

    specs
}

/// Applies an ordered list of [`ViewSpec`]s to a table.
#[derive(Debug, Clone)]
pub struct Bucketizer {
    specs: Vec<ViewSpec>,
}

impl Default for Bucketizer {
    fn default() -> Self {
        Self::new(default_views())
    }
}

impl Bucketizer {
    pub fn new(specs: Vec<ViewSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[ViewSpec] {
        &self.specs
    }

    pub fn bucketize<T: Table>(&self, table: &T) -> ViewSet<T> {
        let mut views = ViewSet::new();

        for spec in &self.specs {
            let rows: Vec<usize> = (0..table.len())
                .filter(|&row| spec.predicate.matches(table, row))
                .collect();
            debug!(view = %spec.name, rows = rows.len(), "bucketized");
            views.insert(spec.name.clone(), table.select(&rows));
        }

        views
    }
}
