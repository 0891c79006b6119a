//! Output file naming.
//!
//! Every workbook lands in `<root>/<domain>/` and carries a local timestamp,
//! so repeated runs never overwrite each other. Within one run, pages that
//! share a slug (`/post` and `/post/`) get a numeric suffix.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub fn timestamp(now: DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Filesystem-safe name for a page URL.
///
/// The scheme is dropped, as is the host when it is the site's own domain.
/// Slashes and characters that are not allowed in file names become hyphens;
/// runs of hyphens collapse to one and none are left at either end.
pub fn page_slug(page: &str, domain: &str) -> String {
    let rest = page
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let rest = strip_host(rest, domain);

    let replaced: String = rest
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_whitespace() || c.is_control() => '-',
            c => c,
        })
        .collect();

    let mut slug = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        domain.to_string()
    } else {
        slug.to_string()
    }
}

fn strip_host<'a>(rest: &'a str, domain: &str) -> &'a str {
    let (host, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();
    if !domain.is_empty() && (host == domain || host == format!("www.{}", domain)) {
        path
    } else {
        rest
    }
}

pub fn page_report_path(root: &Path, domain: &str, page: &str, stamp: &str) -> PathBuf {
    root.join(domain)
        .join(format!("{}-{}.xlsx", page_slug(page, domain), stamp))
}

/// `path`, or the first of `<stem>-2.xlsx`, `<stem>-3.xlsx`, ... that is
/// neither in `taken` nor already on disk
pub fn unique_path(path: PathBuf, taken: &HashSet<PathBuf>) -> PathBuf {
    let free = |p: &Path| !taken.contains(p) && !p.exists();
    if free(&path) {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 2;
    loop {
        let candidate = path.with_file_name(format!("{}-{}{}", stem, n, extension));
        if free(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

pub fn aggregate_report_path(root: &Path, domain: &str, stamp: &str) -> PathBuf {
    root.join(domain)
        .join(format!("{}-all-queries-{}.xlsx", domain, stamp))
}

pub fn page_list_path(root: &Path, domain: &str, stamp: &str) -> PathBuf {
    root.join(domain)
        .join(format!("{}-pages-{}.xlsx", domain, stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let now = Local.with_ymd_and_hms(2024, 5, 7, 9, 3, 1).unwrap();
        assert_eq!(timestamp(now), "2024-05-07-09-03-01");
    }

    #[test]
    fn test_page_path_for_blog_post() {
        let path = page_report_path(
            Path::new("data"),
            "example.com",
            "https://example.com/blog/post",
            "2024-05-07-09-03-01",
        );
        assert_eq!(
            path,
            PathBuf::from("data/example.com/blog-post-2024-05-07-09-03-01.xlsx")
        );
    }

    #[test]
    fn test_slug_has_no_double_or_edge_hyphens() {
        for page in [
            "https://example.com/blog/post/",
            "https://www.example.com//blog///post",
            "http://example.com/-blog/post",
        ] {
            let slug = page_slug(page, "example.com");
            assert_eq!(slug, "blog-post", "{page}");
        }
    }

    #[test]
    fn test_slug_keeps_foreign_host() {
        assert_eq!(
            page_slug("https://blog.example.com/post", "example.com"),
            "blog.example.com-post"
        );
    }

    #[test]
    fn test_slug_of_home_page_is_domain() {
        assert_eq!(page_slug("https://example.com/", "example.com"), "example.com");
    }

    #[test]
    fn test_slug_replaces_reserved_characters() {
        assert_eq!(
            page_slug("https://example.com/search?q=a:b", "example.com"),
            "search-q=a-b"
        );
    }

    #[test]
    fn test_unique_path_suffixes_taken_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("blog-post-ts.xlsx");
        let mut taken = HashSet::new();

        assert_eq!(unique_path(first.clone(), &taken), first);
        taken.insert(first.clone());

        let second = unique_path(first.clone(), &taken);
        assert_eq!(second, dir.path().join("blog-post-ts-2.xlsx"));

        // A file already on disk counts as taken too
        std::fs::write(&second, b"").unwrap();
        assert_eq!(
            unique_path(first, &taken),
            dir.path().join("blog-post-ts-3.xlsx")
        );
    }

    #[test]
    fn test_aggregate_and_page_list_paths() {
        let root = Path::new("out");
        assert_eq!(
            aggregate_report_path(root, "example.com", "ts"),
            PathBuf::from("out/example.com/example.com-all-queries-ts.xlsx")
        );
        assert_eq!(
            page_list_path(root, "example.com", "ts"),
            PathBuf::from("out/example.com/example.com-pages-ts.xlsx")
        );
    }
}
