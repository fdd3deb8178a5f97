use std::sync::Arc;

use error_stack::{report, ResultExt};
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{
    a1_notation::A1Notation,
    drive::FolderId,
    spreadsheet::{GridSpan, Rgb, SheetProperties, SortOrder, SpreadsheetHandle},
};
use crate::ports::{
    file_storage::FileStorage,
    operation::{FolderItem, OperationError, SpreadsheetOperation},
    service_error::ServiceError,
    spreadsheet_service::SpreadsheetService,
};

use super::{
    batch_runner::{BatchReport, FolderBatchRunner},
    folders::create_spreadsheet_in_folder,
};

pub const URL_SHEET_HEADER: [&str; 2] = ["Sheet Name", "Urls"];

/// `#c9daf8`
pub const HEADER_BACKGROUND: Rgb = Rgb {
    red: 201.0 / 255.0,
    green: 218.0 / 255.0,
    blue: 248.0 / 255.0,
};

#[derive(Error, Debug)]
pub enum UrlIndexError {
    #[error("Failed to resolve folder '{0}'")]
    FolderResolution(String),
    #[error("Failed to create the index spreadsheet")]
    Setup,
    #[error("Failed to collect file links")]
    Batch,
    #[error("Failed to format the index sheet")]
    Formatting,
}

/// The index built by [`create_url_sheet_for_folder`].
#[derive(Debug)]
pub struct UrlIndex {
    pub spreadsheet: SpreadsheetHandle,
    pub sheet_title: String,
    pub report: BatchReport,
}

/// Appends a `(name, url)` row per visited spreadsheet.
struct UrlRowOperation {
    sheets: Arc<dyn SpreadsheetService>,
    index: SpreadsheetHandle,
    sheet_title: String,
}

#[async_trait::async_trait]
impl SpreadsheetOperation for UrlRowOperation {
    fn name(&self) -> &str {
        "url-index"
    }

    async fn apply(&mut self, item: &FolderItem) -> error_stack::Result<(), OperationError> {
        let target = &item.spreadsheet;
        self.sheets
            .append_row(
                &self.index.id,
                &self.sheet_title,
                vec![target.name.clone(), target.url.clone()],
            )
            .await
            .change_context_lazy(|| OperationError::failed(self.name(), target.name.clone()))
    }
}

/// Builds `Urls <folder name>`, a spreadsheet in the folder listing every other spreadsheet
/// of the folder with its link, sorted by name under a styled header.
#[instrument(skip(runner, storage, sheets))]
pub async fn create_url_sheet_for_folder(
    runner: &FolderBatchRunner,
    storage: Arc<dyn FileStorage>,
    sheets: Arc<dyn SpreadsheetService>,
    folder_id: &FolderId,
) -> error_stack::Result<UrlIndex, UrlIndexError> {
    let folder = storage
        .folder(folder_id)
        .await
        .change_context_lazy(|| UrlIndexError::FolderResolution(folder_id.to_string()))?;
    let filename = format!("Urls {}", folder.name);

    let spreadsheet =
        create_spreadsheet_in_folder(storage.as_ref(), sheets.as_ref(), &filename, folder_id)
            .await
            .change_context(UrlIndexError::Setup)?;

    let first_sheet = sheets
        .sheets(&spreadsheet.id)
        .await
        .change_context(UrlIndexError::Setup)?
        .into_iter()
        .next()
        .ok_or(report!(UrlIndexError::Setup))
        .attach_printable("New spreadsheet has no sheets")?;
    sheets
        .rename_sheet(&spreadsheet.id, first_sheet.sheet_id, &filename)
        .await
        .change_context(UrlIndexError::Setup)?;

    let mut operation = UrlRowOperation {
        sheets: Arc::clone(&sheets),
        index: spreadsheet.clone(),
        sheet_title: filename.clone(),
    };
    // The index lives in the folder too and must not list itself
    let report = runner
        .run(folder_id, &mut operation, &[spreadsheet.name.clone()])
        .await
        .change_context(UrlIndexError::Batch)?;

    format_url_sheet(sheets.as_ref(), &spreadsheet, &filename)
        .await
        .change_context(UrlIndexError::Formatting)
        .attach_printable_lazy(|| format!("Index left unformatted at {}", spreadsheet.url))?;

    info!("Index {} lists {} files", spreadsheet.url, report.applied());
    Ok(UrlIndex {
        spreadsheet,
        sheet_title: filename,
        report,
    })
}

/// Sorts the rows by name, puts the header on top, trims the grid to the data and styles
/// the header.
async fn format_url_sheet(
    sheets: &dyn SpreadsheetService,
    spreadsheet: &SpreadsheetHandle,
    sheet_title: &str,
) -> error_stack::Result<(), ServiceError> {
    let id = &spreadsheet.id;
    let width = URL_SHEET_HEADER.len() as u32;

    let sheet = sheets.sheet_by_name(id, sheet_title).await?;
    let extent = sheets.data_extent(id, &sheet).await?;
    if extent.rows > 1 {
        let rows = GridSpan::rows(sheet.sheet_id, 0, extent.rows, width);
        sheets.sort_span(id, rows, 0, SortOrder::Ascending).await?;
    }

    sheets.insert_rows(id, sheet.sheet_id, 0, 1).await?;
    sheets
        .write_values(
            id,
            &A1Notation::row(sheet_title, 1, width),
            vec![URL_SHEET_HEADER.iter().map(|h| h.to_string()).collect()],
        )
        .await?;

    let sheet: SheetProperties = sheets.sheet_by_name(id, sheet_title).await?;
    let extent = sheets.data_extent(id, &sheet).await?;
    if sheet.row_count > extent.rows {
        sheets
            .delete_rows(id, sheet.sheet_id, extent.rows, sheet.row_count - extent.rows)
            .await?;
    }
    if sheet.column_count > extent.columns {
        sheets
            .delete_columns(
                id,
                sheet.sheet_id,
                extent.columns,
                sheet.column_count - extent.columns,
            )
            .await?;
    }

    sheets
        .style_span(
            id,
            GridSpan::rows(sheet.sheet_id, 0, 1, width),
            HEADER_BACKGROUND,
            true,
        )
        .await
}
