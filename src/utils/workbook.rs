use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};

pub const MAX_COLUMN_WIDTH: usize = 50;

/// Bold white on blue with thin borders, used for every report header row
pub fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x2F75B5))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
}

pub fn cell_format() -> Format {
    Format::new().set_border(FormatBorder::Thin)
}

/// Widest cell per column (header included), capped at `MAX_COLUMN_WIDTH`
pub fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (widest + 2).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Appends a sheet with a styled header row followed by `rows`
pub fn add_sheet(
    workbook: &mut Workbook,
    name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<(), XlsxError> {
    let header = header_format();
    let cell = cell_format();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet.write_string_with_format(r as u32 + 1, col as u16, value, &cell)?;
        }
    }
    for (col, width) in column_widths(headers, rows).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64)?;
    }
    Ok(())
}

/// Single-sheet workbook as xlsx bytes
pub fn single_sheet(name: &str, headers: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, name, headers, rows)?;
    workbook.save_to_buffer()
}

pub fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_widths_are_capped() {
        let rows = vec![vec!["x".repeat(80), "ab".into()]];
        assert_eq!(column_widths(&["Name", "Code"], &rows), vec![MAX_COLUMN_WIDTH, 6]);
    }

    #[test]
    fn test_single_sheet_is_a_zip() {
        let bytes = single_sheet("Responses", &["Employee ID"], &[vec!["EMP001".into()]]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
