//! Spreadsheet reader for rate uploads

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use crate::application::ingest::{Cell, SheetRows};
use crate::shared::types::InfraError;

/// Read one worksheet of an `.xlsx`/`.xls`/`.ods` workbook as raw cells.
///
/// `sheet` picks a worksheet by name; `None` reads the first one. Rows and
/// columns before the used range are padded with empty cells so indices
/// match the sheet as the user sees it.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<SheetRows, InfraError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| InfraError::Sheet(format!("could not open {}: {}", path.display(), e)))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| InfraError::Sheet(format!("sheet {}: {}", name, e)))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| InfraError::Sheet(format!("{} has no worksheets", path.display())))?
            .map_err(|e| InfraError::Sheet(e.to_string()))?,
    };

    let rows = range_to_rows(&range);
    debug!(path = %path.display(), sheet, rows = rows.len(), "Sheet read");
    Ok(rows)
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, InfraError> {
    let workbook = open_workbook_auto(path)
        .map_err(|e| InfraError::Sheet(format!("could not open {}: {}", path.display(), e)))?;
    Ok(workbook.sheet_names().to_vec())
}

fn range_to_rows(range: &Range<Data>) -> SheetRows {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: SheetRows = vec![Vec::new(); row_offset];
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(Cell::Empty)
            .take(col_offset)
            .chain(row.iter().map(to_cell))
            .collect()
    }));
    rows
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::from(s.as_str()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Error(_) => Cell::Empty,
        other => Cell::text(other.to_string()),
    }
}
