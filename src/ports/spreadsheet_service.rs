use crate::domain::{
    a1_notation::A1Notation,
    drive::FileId,
    spreadsheet::{DataExtent, GridSpan, Rgb, SheetProperties, SortOrder, SpreadsheetHandle},
};

use super::service_error::{ResourceKind, ServiceError};

/// Sheet-level editing of spreadsheets.
#[async_trait::async_trait]
pub trait SpreadsheetService: Send + Sync {
    async fn open(
        &self,
        spreadsheet_id: &FileId,
    ) -> error_stack::Result<SpreadsheetHandle, ServiceError>;

    /// Creates a spreadsheet with one default sheet in the caller's root folder.
    async fn create(&self, title: &str) -> error_stack::Result<SpreadsheetHandle, ServiceError>;

    /// Sheets in tab order.
    async fn sheets(
        &self,
        spreadsheet_id: &FileId,
    ) -> error_stack::Result<Vec<SheetProperties>, ServiceError>;

    async fn rename_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        title: &str,
    ) -> error_stack::Result<(), ServiceError>;

    async fn delete_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
    ) -> error_stack::Result<(), ServiceError>;

    /// Copies a sheet within the same spreadsheet under `new_title`.
    async fn duplicate_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        new_title: &str,
    ) -> error_stack::Result<SheetProperties, ServiceError>;

    /// Copies a sheet into another spreadsheet. The service picks the copy's title.
    async fn copy_sheet_to(
        &self,
        source_spreadsheet_id: &FileId,
        sheet_id: i32,
        destination_spreadsheet_id: &FileId,
    ) -> error_stack::Result<SheetProperties, ServiceError>;

    async fn read_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
    ) -> error_stack::Result<Vec<Vec<String>>, ServiceError>;

    async fn write_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
        values: Vec<Vec<String>>,
    ) -> error_stack::Result<(), ServiceError>;

    /// Appends a row after the last row holding data.
    async fn append_row(
        &self,
        spreadsheet_id: &FileId,
        sheet_title: &str,
        row: Vec<String>,
    ) -> error_stack::Result<(), ServiceError>;

    /// Inserts `count` empty rows before the 0-based `before_index`.
    async fn insert_rows(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        before_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError>;

    /// Deletes `count` rows starting at the 0-based `start_index`.
    async fn delete_rows(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        start_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError>;

    async fn delete_columns(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        start_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError>;

    async fn data_extent(
        &self,
        spreadsheet_id: &FileId,
        sheet: &SheetProperties,
    ) -> error_stack::Result<DataExtent, ServiceError>;

    async fn sort_span(
        &self,
        spreadsheet_id: &FileId,
        span: GridSpan,
        column_index: u32,
        order: SortOrder,
    ) -> error_stack::Result<(), ServiceError>;

    async fn style_span(
        &self,
        spreadsheet_id: &FileId,
        span: GridSpan,
        background: Rgb,
        bold: bool,
    ) -> error_stack::Result<(), ServiceError>;

    async fn sheet_by_name(
        &self,
        spreadsheet_id: &FileId,
        title: &str,
    ) -> error_stack::Result<SheetProperties, ServiceError> {
        let sheets = self.sheets(spreadsheet_id).await?;
        sheets
            .into_iter()
            .find(|sheet| sheet.title == title)
            .ok_or_else(|| {
                error_stack::report!(ServiceError::not_found(ResourceKind::Sheet, title))
                    .attach_printable(format!("Spreadsheet: {}", spreadsheet_id))
            })
    }
}
