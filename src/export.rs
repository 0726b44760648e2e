use std::path::Path;

use rust_xlsxwriter::{Color, ColNum, Format, FormatPattern, RowNum, Workbook, Worksheet, XlsxError};

use crate::analysis::classify::ClassifiedRecord;
use crate::constants::columns;
use crate::constants::export::{HIGHLIGHT_RGB, SHEET_NAME};
use crate::data::model::CellValue;
use crate::errors::ExportError;

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// One data row of the exported sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub cells: Vec<CellValue>,
    /// Every cell of the row gets the highlight fill.
    pub highlighted: bool,
}

/// What the `Results` sheet will contain, before any formatting is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSheet {
    pub header: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl ResultSheet {
    /// Source columns followed by `Lower_Bound`, `Upper_Bound`, `IS_OUTLIER`;
    /// abnormal rows are highlighted.
    pub fn build(source_columns: &[String], classified: &[ClassifiedRecord]) -> Self {
        let header: Vec<String> = source_columns
            .iter()
            .cloned()
            .chain(columns::DERIVED.iter().map(|c| c.to_string()))
            .collect();

        let rows = classified
            .iter()
            .map(|row| SheetRow {
                cells: header.iter().map(|col| row.value(col)).collect(),
                highlighted: row.is_abnormal(),
            })
            .collect();

        ResultSheet { header, rows }
    }

    /// Zero-based data-row positions that will be shaded.
    pub fn highlighted_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.highlighted)
            .map(|(i, _)| i)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Workbook writer
// ---------------------------------------------------------------------------

/// Render classified rows into an in-memory `.xlsx` file.
pub fn results_workbook(
    source_columns: &[String],
    classified: &[ClassifiedRecord],
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(&ResultSheet::build(source_columns, classified))?;
    Ok(workbook.save_to_buffer()?)
}

/// Render classified rows and write the workbook to `path`.
pub fn save_results(
    path: &Path,
    source_columns: &[String],
    classified: &[ClassifiedRecord],
) -> Result<(), ExportError> {
    let sheet = ResultSheet::build(source_columns, classified);
    let mut workbook = build_workbook(&sheet)?;
    workbook.save(path)?;
    log::info!(
        "exported {} rows ({} highlighted) to {}",
        sheet.rows.len(),
        sheet.highlighted_rows().len(),
        path.display()
    );
    Ok(())
}

fn build_workbook(sheet: &ResultSheet) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    let highlight = Format::new()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HIGHLIGHT_RGB));

    for (col, name) in sheet.header.iter().enumerate() {
        worksheet.write_string_with_format(0, col as ColNum, name, &header_format)?;
    }

    for (i, row) in sheet.rows.iter().enumerate() {
        let row_num = (i + 1) as RowNum;
        let format = row.highlighted.then_some(&highlight);
        for (col, cell) in row.cells.iter().enumerate() {
            write_cell(worksheet, row_num, col as ColNum, cell, format)?;
        }
    }

    worksheet.autofit();
    Ok(workbook)
}

/// Non-finite floats are written as text, Excel has no representation for them.
fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    cell: &CellValue,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match cell {
        CellValue::String(s) | CellValue::Date(s) => write_text(worksheet, row, col, s, format),
        CellValue::Integer(i) => write_number(worksheet, row, col, *i as f64, format),
        CellValue::Float(v) if v.is_finite() => write_number(worksheet, row, col, *v, format),
        CellValue::Float(v) => write_text(worksheet, row, col, &v.to_string(), format),
        CellValue::Bool(b) => {
            match format {
                Some(f) => worksheet.write_boolean_with_format(row, col, *b, f)?,
                None => worksheet.write_boolean(row, col, *b)?,
            };
            Ok(())
        }
        CellValue::Null => {
            if let Some(f) = format {
                worksheet.write_blank(row, col, f)?;
            }
            Ok(())
        }
    }
}

fn write_text(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    text: &str,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match format {
        Some(f) => worksheet.write_string_with_format(row, col, text, f)?,
        None => worksheet.write_string(row, col, text)?,
    };
    Ok(())
}

fn write_number(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: f64,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match format {
        Some(f) => worksheet.write_number_with_format(row, col, value, f)?,
        None => worksheet.write_number(row, col, value)?,
    };
    Ok(())
}
