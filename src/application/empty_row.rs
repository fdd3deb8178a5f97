use error_stack::report;
use tracing::{instrument, warn};

use crate::domain::{
    a1_notation::{parse_cell_ref, A1Notation},
    drive::FileId,
    empty_row,
};
use crate::ports::{
    service_error::{ResourceKind, ServiceError},
    spreadsheet_service::SpreadsheetService,
};

/// First whole empty row of `range`, as a 1-based sheet row number.
///
/// `start_row` defaults to the row of the range's first cell, or 1 for whole-sheet ranges.
/// Open-ended (`A2:C`) and whole-sheet ranges reach down to the sheet's last grid row.
#[instrument(skip(sheets))]
pub async fn first_empty_row(
    sheets: &dyn SpreadsheetService,
    spreadsheet_id: &FileId,
    range: &A1Notation,
    start_row: Option<u32>,
) -> error_stack::Result<Option<u32>, ServiceError> {
    let mut values = sheets.read_values(spreadsheet_id, range).await?;

    let (title, cells) = range.split();
    let mut bounds = cells.split(':').map(parse_cell_ref);
    let first = bounds.next().flatten();
    let last = bounds.next();
    let first_row = first.and_then(|(row, _)| row).unwrap_or(1);

    // Trailing empty rows are omitted by the service, so restore the requested height
    let height = match (cells.is_empty(), last) {
        (false, None) => 1,
        (false, Some(Some((Some(last_row), _)))) => last_row.saturating_sub(first_row) + 1,
        _ => {
            let sheet = match title {
                Some(title) => sheets.sheet_by_name(spreadsheet_id, &title).await?,
                None => sheets
                    .sheets(spreadsheet_id)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        report!(ServiceError::not_found(ResourceKind::Sheet, range.to_string()))
                    })?,
            };
            sheet.row_count.saturating_sub(first_row - 1)
        }
    };
    if values.len() < height as usize {
        values.resize_with(height as usize, Vec::new);
    }

    let start_row = start_row.unwrap_or(first_row);

    let row = empty_row::first_empty_row(&values, start_row);
    if row.is_none() {
        warn!("Could not find empty row in {}", range);
    }
    Ok(row)
}
