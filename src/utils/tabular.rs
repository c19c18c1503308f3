// Uploaded roster sheets (CSV or XLSX) normalised into header + string rows
use crate::utils::error::{AppError, AppResult};
use crate::utils::upload::UploadedFile;
use calamine::{Reader, Xlsx};
use std::io::Cursor;

pub const SPREADSHEET_EXTENSIONS: &[&str] = &[".csv", ".xlsx"];

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_upload(file: &UploadedFile) -> AppResult<Self> {
        match file.extension().as_str() {
            ".csv" => Self::from_csv(&file.bytes),
            ".xlsx" => Self::from_xlsx(&file.bytes),
            _ => Err(AppError::bad_request("File must be CSV or Excel format")),
        }
    }

    pub fn from_csv(bytes: &[u8]) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| AppError::Spreadsheet(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| AppError::Spreadsheet(e.to_string()))?;
            let row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            if row.iter().any(|v| !v.is_empty()) {
                rows.push(row);
            }
        }

        Ok(Self { headers, rows })
    }

    pub fn from_xlsx(bytes: &[u8]) -> AppResult<Self> {
        let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::Spreadsheet(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::Spreadsheet("Workbook has no sheets".to_string()))?
            .map_err(|e| AppError::Spreadsheet(e.to_string()))?;

        let mut iter = range.rows();
        let headers = match iter.next() {
            Some(cells) => cells.iter().map(|c| c.to_string().trim().to_string()).collect(),
            None => Vec::new(),
        };

        let rows = iter
            .map(|cells| {
                cells
                    .iter()
                    .map(|c| c.to_string().trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|row| row.iter().any(|v| !v.is_empty()))
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |row| Record { table: self, row })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    row: &'a [String],
}

impl<'a> Record<'a> {
    /// Trimmed cell value, empty when the column or cell is absent.
    pub fn get(&self, column: &str) -> &'a str {
        self.table
            .column_index(column)
            .and_then(|idx| self.row.get(idx))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_parsing_skips_blank_rows() {
        let csv = b"Employee ID,Employee Name,Cadre,Project Name\n\
                    EMP001, Rajesh Kumar ,Manager,Solar\n\
                    ,,,\n\
                    EMP002,Priya Sharma,Engineer,Wind\n";
        let table = Table::from_csv(csv).unwrap();
        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.len(), 2);

        let first = table.records().next().unwrap();
        assert_eq!(first.get("Employee Name"), "Rajesh Kumar");
        assert_eq!(first.get("Email"), "");
    }

    #[test]
    fn test_missing_columns() {
        let table = Table::from_csv(b"Employee ID,Cadre\nE1,M\n").unwrap();
        assert_eq!(
            table.missing_columns(&["Employee ID", "Employee Name", "Cadre"]),
            vec!["Employee Name".to_string()]
        );
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let table = Table::from_csv(b"Cab Number,Employee ID,Pickup Location,Time\n1,E1\n").unwrap();
        let rec = table.records().next().unwrap();
        assert_eq!(rec.get("Employee ID"), "E1");
        assert_eq!(rec.get("Time"), "");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = UploadedFile {
            filename: "roster.txt".into(),
            content_type: None,
            bytes: vec![],
        };
        assert!(Table::from_upload(&file).is_err());
    }

    #[test]
    fn test_xlsx_round_trip_with_writer() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Cab Number").unwrap();
        sheet.write_string(0, 1, "Employee ID").unwrap();
        sheet.write_number(1, 0, 3.0).unwrap();
        sheet.write_string(1, 1, "EMP007").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = Table::from_xlsx(&bytes).unwrap();
        let rec = table.records().next().unwrap();
        assert_eq!(rec.get("Cab Number"), "3");
        assert_eq!(rec.get("Employee ID"), "EMP007");
    }
}
