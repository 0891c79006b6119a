//! Workbook output.
//!
//! [`ReportWriter`] turns a [`ViewSet`] into an xlsx file with one sheet per
//! view, in view order. The whole workbook is assembled in memory and written
//! to a temporary file that is renamed into place, so an interrupted run
//! normally leaves no half-written workbook behind. This is best effort: the
//! rename is only atomic where the filesystem makes it so.

pub mod filename;

pub use filename::{
    aggregate_report_path, page_list_path, page_report_path, page_slug, timestamp, unique_path,
};

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::app::Result;
use crate::domain::{Cell, Column, Table, ViewSet};

/// Fixed width for columns that get one; the rest keep the default
fn column_width(column: Column) -> Option<f64> {
    match column {
        Column::Page | Column::Title => Some(90.0),
        Column::Query | Column::Impressions | Column::ExistsOnSite | Column::WordCount => {
            Some(30.0)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportWriter {
    hidden: Vec<Column>,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave `column` out of every sheet this writer produces
    pub fn without_column(mut self, column: Column) -> Self {
        if !self.hidden.contains(&column) {
            self.hidden.push(column);
        }
        self
    }

    /// Write one sheet per view to `path`, creating parent directories
    pub fn write<T: Table>(&self, views: &ViewSet<T>, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = header_format();

        for (name, table) in views.iter() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name)?;
            self.fill_sheet(sheet, table, &header)?;
        }

        save(&mut workbook, path)?;
        debug!(path = %path.display(), sheets = views.len(), "workbook written");
        Ok(())
    }

    /// Write a single table to a one-sheet workbook
    pub fn write_table<T: Table>(&self, sheet_name: &str, table: &T, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = header_format();

        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        self.fill_sheet(sheet, table, &header)?;

        save(&mut workbook, path)?;
        debug!(path = %path.display(), rows = table.len(), "table written");
        Ok(())
    }

    fn visible_columns<T: Table>(&self, table: &T) -> Vec<Column> {
        table
            .columns()
            .iter()
            .copied()
            .filter(|c| !self.hidden.contains(c))
            .collect()
    }

    fn fill_sheet<T: Table>(&self, sheet: &mut Worksheet, table: &T, header: &Format) -> Result<()> {
        let columns = self.visible_columns(table);

        for (col, column) in columns.iter().enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, column.name(), header)?;
            if let Some(width) = column_width(*column) {
                sheet.set_column_width(col, width)?;
            }
        }
        sheet.set_freeze_panes(1, 0)?;

        for row in 0..table.len() {
            let xlsx_row = row as u32 + 1;
            for (col, column) in columns.iter().enumerate() {
                let col = col as u16;
                // Strings go in as plain text so URLs are never turned into links
                match table.cell(row, *column) {
                    Cell::Text(text) => {
                        sheet.write_string(xlsx_row, col, text)?;
                    }
                    Cell::Int(value) => {
                        sheet.write_number(xlsx_row, col, value as f64)?;
                    }
                    Cell::Float(value) => {
                        sheet.write_number(xlsx_row, col, value)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        Ok(())
    }
}

fn header_format() -> Format {
    Format::new().set_bold().set_border(FormatBorder::Thin)
}

fn save(workbook: &mut Workbook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let buffer = workbook.save_to_buffer()?;
    let partial = partial_path(path);
    fs::write(&partial, buffer)?;
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PageRow, PageTable, QueryRow, QueryTable};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use std::io::Read;
    use tempfile::TempDir;

    fn views() -> ViewSet<QueryTable> {
        let mut first = QueryTable::new(vec![
            QueryRow::new("rust tips", 3, 40, 0.1, 6.2),
            QueryRow::new("rust", 1, 20, 0.0, 11.0),
        ]);
        first.attach_page("https://example.com/blog/post");

        let mut views = ViewSet::new();
        views.insert("All Keywords", first.clone());
        views.insert("Questions 5-10", first.select(&[]));
        views.insert("All Keywords 5-10", first.select(&[0]));
        views
    }

    #[test]
    fn test_round_trip_sheets_rows_and_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("example.com").join("report.xlsx");
        ReportWriter::new().write(&views(), &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["All Keywords", "Questions 5-10", "All Keywords 5-10"]
        );

        let all = workbook.worksheet_range("All Keywords").unwrap();
        assert_eq!(all.height(), 3);
        let header: Vec<String> = all.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            header,
            vec!["page", "query", "clicks", "impressions", "ctr", "position"]
        );
        let first = &all.rows().nth(1).unwrap();
        assert_eq!(first[0], Data::String("https://example.com/blog/post".into()));
        assert_eq!(first[1], Data::String("rust tips".into()));
        assert_eq!(first[3], Data::Float(40.0));
        assert_eq!(first[5], Data::Float(6.2));

        let empty = workbook.worksheet_range("Questions 5-10").unwrap();
        assert_eq!(empty.height(), 1);
        assert_eq!(workbook.worksheet_range("All Keywords 5-10").unwrap().height(), 2);
    }

    #[test]
    fn test_urls_are_not_hyperlinks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        ReportWriter::new().write(&views(), &path).unwrap();

        let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(!sheet.contains("<hyperlink"));
        assert!(archive
            .file_names()
            .all(|name| !name.starts_with("xl/worksheets/_rels/")));
    }

    #[test]
    fn test_hidden_column_is_left_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        ReportWriter::new()
            .without_column(Column::Ctr)
            .write(&views(), &path)
            .unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("All Keywords").unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, vec!["page", "query", "clicks", "impressions", "position"]);
    }

    #[test]
    fn test_write_table_page_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pages.xlsx");
        let table = PageTable::new(vec![PageRow {
            page: "https://example.com/a".into(),
            clicks: 4,
            impressions: 100,
            ctr: 0.04,
            position: 3.5,
        }]);
        ReportWriter::new().write_table("Pages", &table, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Pages"]);
        let range = workbook.worksheet_range("Pages").unwrap();
        assert_eq!(range.height(), 2);
        assert!(!dir.path().join("pages.xlsx.partial").exists());
    }
}
