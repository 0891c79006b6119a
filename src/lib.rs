//! # gsc-buckets
//!
//! Pulls Search Console query reports for a site, checks each query against
//! the text of its page and splits the result into overlapping views by
//! position range, question form and phrase length, one xlsx sheet per view.
//!
//! ## Architecture
//!
//! ```text
//! Auth → Source (page list) → per page: Source (queries) → Enrich → Bucket → Report
//!                                                         ↘ aggregate → Bucket → Report
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Log in once; the token is cached
//! gsc-buckets auth
//!
//! # Aggregate workbook for the last 90 days
//! gsc-buckets run example.com
//!
//! # One workbook per page plus the aggregate, last 28 days
//! gsc-buckets run example.com --days 28 --mode both
//!
//! # A single page
//! gsc-buckets page example.com https://example.com/blog/post
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`auth`]: OAuth login and token cache
//! - [`bucket`]: View predicates and the bucketizer
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Config file and per-run settings
//! - [`domain`]: Rows, tables, articles and view sets
//! - [`enrich`]: `exists_on_site` counting
//! - [`pipeline`]: The run loop
//! - [`report`]: xlsx output and file naming
//! - [`scraper`]: Article fetching and text extraction
//! - [`source`]: Search Console reports

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the config to the
/// authenticator, the API client and the article fetcher.
pub mod app;

/// Google OAuth 2.0 installed-application flow with a JSON token cache.
pub mod auth;

/// Overlapping views over a query table.
///
/// - [`Predicate`](bucket::Predicate): row membership test
/// - [`Bucketizer`](bucket::Bucketizer): ordered view specs applied to a table
pub mod bucket;

/// Command-line interface using clap.
///
/// - `run <domain>` - Every page plus the aggregate
/// - `pages <domain>` - Page list only
/// - `page <domain> <url>` - One page
/// - `auth` - Log in
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/gsc-buckets/config.toml`; command-line flags are
/// merged on top into a [`RunConfig`](config::RunConfig).
pub mod config;

/// Core domain models.
pub mod domain;

/// Query enrichment from page articles or a whole-site snapshot.
pub mod enrich;

/// Sequential orchestration of a run.
pub mod pipeline;

/// xlsx workbooks, one sheet per view.
pub mod report;

/// Article fetching for query enrichment.
///
/// - [`HttpScraper`](scraper::HttpScraper): reqwest with browser-like headers
/// - [`ChromeScraper`](scraper::ChromeScraper): headless Chrome via chromiumoxide
/// - [`Scraper`](scraper::Scraper): Async trait for scraping implementations
pub mod scraper;

/// Search Console reports.
///
/// - [`ReportSource`](source::ReportSource): Async trait for report fetching
/// - [`SearchConsoleSource`](source::SearchConsoleSource): Search Analytics API client
pub mod source;
