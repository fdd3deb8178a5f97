use error_stack::{report, Report, ResultExt};
use google_sheets4::{
    api::{
        BatchUpdateSpreadsheetRequest, CellData, CellFormat, Color,
        CopySheetToAnotherSpreadsheetRequest, DeleteDimensionRequest, DeleteSheetRequest,
        DimensionRange, DuplicateSheetRequest, GridRange, InsertDimensionRequest,
        RepeatCellRequest, Request, Response as Reply, SheetProperties as ApiSheetProperties,
        SortRangeRequest, SortSpec, Spreadsheet, SpreadsheetProperties, TextFormat,
        UpdateSheetPropertiesRequest, ValueRange,
    },
    FieldMask, Sheets,
};
use serde_json::Value;
use tracing::instrument;

use crate::domain::{
    a1_notation::A1Notation,
    drive::FileId,
    spreadsheet::{DataExtent, GridSpan, Rgb, SheetProperties, SortOrder, SpreadsheetHandle},
};
use crate::ports::{
    service_error::{ResourceKind, ServiceError},
    spreadsheet_service::SpreadsheetService,
};

use super::{
    auth::GoogleAuthenticator,
    error::{classify_body, classify_status},
    http_client::{HttpClient, HttpsConnector},
};

pub struct GoogleSheets {
    hub: Sheets<HttpsConnector>,
}

impl std::fmt::Debug for GoogleSheets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GoogleSheets")
    }
}

fn service_error(error: google_sheets4::Error, kind: ResourceKind, id: &str) -> Report<ServiceError> {
    let context = match &error {
        google_sheets4::Error::BadRequest(body) => classify_body(body, kind, id),
        google_sheets4::Error::Failure(response) => {
            classify_status(response.status().as_u16(), kind, id)
        }
        other => ServiceError::unclassified(other.to_string()),
    };
    Report::new(error).change_context(context)
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn grid_range(span: GridSpan) -> GridRange {
    GridRange {
        sheet_id: Some(span.sheet_id),
        start_row_index: Some(span.start_row as i32),
        end_row_index: Some(span.end_row as i32),
        start_column_index: Some(span.start_column as i32),
        end_column_index: Some(span.end_column as i32),
    }
}

fn dimension_range(sheet_id: i32, dimension: &str, start: u32, count: u32) -> DimensionRange {
    DimensionRange {
        sheet_id: Some(sheet_id),
        dimension: Some(dimension.to_string()),
        start_index: Some(start as i32),
        end_index: Some((start + count) as i32),
    }
}

fn sheet_properties(properties: ApiSheetProperties) -> Option<SheetProperties> {
    let grid = properties.grid_properties.unwrap_or_default();
    Some(SheetProperties {
        sheet_id: properties.sheet_id?,
        title: properties.title?,
        index: properties.index.unwrap_or_default().max(0) as u32,
        row_count: grid.row_count.unwrap_or_default().max(0) as u32,
        column_count: grid.column_count.unwrap_or_default().max(0) as u32,
    })
}

impl GoogleSheets {
    #[instrument(name = "GoogleSheets::new", skip(client, authenticator))]
    pub fn new(client: HttpClient, authenticator: GoogleAuthenticator) -> Self {
        Self {
            hub: Sheets::new(client, authenticator),
        }
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &FileId,
        requests: Vec<Request>,
    ) -> error_stack::Result<Vec<Reply>, ServiceError> {
        let request = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        let (_, response) = self
            .hub
            .spreadsheets()
            .batch_update(request, spreadsheet_id.as_ref())
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::Spreadsheet, spreadsheet_id.as_ref()))?;

        Ok(response.replies.unwrap_or_default())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
        values: Vec<Vec<String>>,
    ) -> error_stack::Result<(), ServiceError> {
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: None,
            values: Some(
                values
                    .into_iter()
                    .map(|row| row.into_iter().map(Value::String).collect())
                    .collect(),
            ),
        };

        self.hub
            .spreadsheets()
            .values_update(value_range, spreadsheet_id.as_ref(), range.as_ref())
            .value_input_option("RAW")
            .doit()
            .await
            .map(|_| ())
            .map_err(|e| service_error(e, ResourceKind::Spreadsheet, spreadsheet_id.as_ref()))
            .attach_printable_lazy(|| format!("Failed to write to range {}", range))
    }
}

#[async_trait::async_trait]
impl SpreadsheetService for GoogleSheets {
    #[instrument]
    async fn open(
        &self,
        spreadsheet_id: &FileId,
    ) -> error_stack::Result<SpreadsheetHandle, ServiceError> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(spreadsheet_id.as_ref())
            .param("fields", "spreadsheetId,spreadsheetUrl,properties.title")
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::Spreadsheet, spreadsheet_id.as_ref()))?;

        Ok(SpreadsheetHandle {
            id: spreadsheet_id.clone(),
            name: spreadsheet
                .properties
                .and_then(|p| p.title)
                .unwrap_or_default(),
            url: spreadsheet.spreadsheet_url.unwrap_or_default(),
        })
    }

    #[instrument]
    async fn create(&self, title: &str) -> error_stack::Result<SpreadsheetHandle, ServiceError> {
        let request = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(title.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .create(request)
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::Spreadsheet, title))?;

        let id = spreadsheet
            .spreadsheet_id
            .ok_or_else(|| report!(ServiceError::unclassified("Created spreadsheet has no id")))?;

        Ok(SpreadsheetHandle {
            id: FileId::new(id),
            name: title.to_string(),
            url: spreadsheet.spreadsheet_url.unwrap_or_default(),
        })
    }

    #[instrument]
    async fn sheets(
        &self,
        spreadsheet_id: &FileId,
    ) -> error_stack::Result<Vec<SheetProperties>, ServiceError> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(spreadsheet_id.as_ref())
            .param("fields", "sheets.properties")
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::Spreadsheet, spreadsheet_id.as_ref()))?;

        let mut sheets: Vec<SheetProperties> = spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| sheet.properties.and_then(sheet_properties))
            .collect();
        sheets.sort_by_key(|sheet| sheet.index);
        Ok(sheets)
    }

    #[instrument]
    async fn rename_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        title: &str,
    ) -> error_stack::Result<(), ServiceError> {
        let request = Request {
            update_sheet_properties: Some(UpdateSheetPropertiesRequest {
                properties: Some(ApiSheetProperties {
                    sheet_id: Some(sheet_id),
                    title: Some(title.to_string()),
                    ..Default::default()
                }),
                fields: Some(FieldMask::new(&["title"])),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }

    #[instrument]
    async fn delete_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
    ) -> error_stack::Result<(), ServiceError> {
        let request = Request {
            delete_sheet: Some(DeleteSheetRequest {
                sheet_id: Some(sheet_id),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }

    #[instrument]
    async fn duplicate_sheet(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        new_title: &str,
    ) -> error_stack::Result<SheetProperties, ServiceError> {
        let request = Request {
            duplicate_sheet: Some(DuplicateSheetRequest {
                source_sheet_id: Some(sheet_id),
                new_sheet_name: Some(new_title.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await?
            .into_iter()
            .find_map(|reply| reply.duplicate_sheet.and_then(|r| r.properties))
            .and_then(sheet_properties)
            .ok_or_else(|| report!(ServiceError::unclassified("Duplicate reply has no properties")))
    }

    #[instrument]
    async fn copy_sheet_to(
        &self,
        source_spreadsheet_id: &FileId,
        sheet_id: i32,
        destination_spreadsheet_id: &FileId,
    ) -> error_stack::Result<SheetProperties, ServiceError> {
        let request = CopySheetToAnotherSpreadsheetRequest {
            destination_spreadsheet_id: Some(destination_spreadsheet_id.to_string()),
        };

        let (_, properties) = self
            .hub
            .spreadsheets()
            .sheets_copy_to(request, source_spreadsheet_id.as_ref(), sheet_id)
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::Sheet, &sheet_id.to_string()))?;

        sheet_properties(properties)
            .ok_or_else(|| report!(ServiceError::unclassified("Copied sheet has no properties")))
    }

    #[instrument]
    async fn read_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
    ) -> error_stack::Result<Vec<Vec<String>>, ServiceError> {
        let (_, value_range) = self
            .hub
            .spreadsheets()
            .values_get(spreadsheet_id.as_ref(), range.as_ref())
            .doit()
            .await
            .map_err(|e| service_error(e, ResourceKind::Spreadsheet, spreadsheet_id.as_ref()))
            .attach_printable_lazy(|| format!("Failed to fetch values for range {}", range))?;

        Ok(value_range
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    #[instrument(skip(values))]
    async fn write_values(
        &self,
        spreadsheet_id: &FileId,
        range: &A1Notation,
        values: Vec<Vec<String>>,
    ) -> error_stack::Result<(), ServiceError> {
        self.update_values(spreadsheet_id, range, values).await
    }

    #[instrument]
    async fn append_row(
        &self,
        spreadsheet_id: &FileId,
        sheet_title: &str,
        row: Vec<String>,
    ) -> error_stack::Result<(), ServiceError> {
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: None,
            values: Some(vec![row.into_iter().map(Value::String).collect()]),
        };
        let range = A1Notation::sheet(sheet_title);

        self.hub
            .spreadsheets()
            .values_append(value_range, spreadsheet_id.as_ref(), range.as_ref())
            .value_input_option("RAW")
            .insert_data_option("INSERT_ROWS")
            .doit()
            .await
            .map(|_| ())
            .map_err(|e| service_error(e, ResourceKind::Sheet, sheet_title))
    }

    #[instrument]
    async fn insert_rows(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        before_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError> {
        let request = Request {
            insert_dimension: Some(InsertDimensionRequest {
                range: Some(dimension_range(sheet_id, "ROWS", before_index, count)),
                inherit_from_before: Some(false),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }

    #[instrument]
    async fn delete_rows(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        start_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError> {
        let request = Request {
            delete_dimension: Some(DeleteDimensionRequest {
                range: Some(dimension_range(sheet_id, "ROWS", start_index, count)),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }

    #[instrument]
    async fn delete_columns(
        &self,
        spreadsheet_id: &FileId,
        sheet_id: i32,
        start_index: u32,
        count: u32,
    ) -> error_stack::Result<(), ServiceError> {
        let request = Request {
            delete_dimension: Some(DeleteDimensionRequest {
                range: Some(dimension_range(sheet_id, "COLUMNS", start_index, count)),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }

    #[instrument]
    async fn data_extent(
        &self,
        spreadsheet_id: &FileId,
        sheet: &SheetProperties,
    ) -> error_stack::Result<DataExtent, ServiceError> {
        let values = self
            .read_values(spreadsheet_id, &A1Notation::sheet(&sheet.title))
            .await?;
        Ok(DataExtent::of_values(&values))
    }

    #[instrument]
    async fn sort_span(
        &self,
        spreadsheet_id: &FileId,
        span: GridSpan,
        column_index: u32,
        order: SortOrder,
    ) -> error_stack::Result<(), ServiceError> {
        let sort_order = match order {
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
        };
        let request = Request {
            sort_range: Some(SortRangeRequest {
                range: Some(grid_range(span)),
                sort_specs: Some(vec![SortSpec {
                    dimension_index: Some(column_index as i32),
                    sort_order: Some(sort_order.to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }

    #[instrument]
    async fn style_span(
        &self,
        spreadsheet_id: &FileId,
        span: GridSpan,
        background: Rgb,
        bold: bool,
    ) -> error_stack::Result<(), ServiceError> {
        let format = CellFormat {
            background_color: Some(Color {
                red: Some(background.red),
                green: Some(background.green),
                blue: Some(background.blue),
                alpha: None,
            }),
            text_format: Some(TextFormat {
                bold: Some(bold),
                ..Default::default()
            }),
            ..Default::default()
        };
        let request = Request {
            repeat_cell: Some(RepeatCellRequest {
                range: Some(grid_range(span)),
                cell: Some(CellData {
                    user_entered_format: Some(format),
                    ..Default::default()
                }),
                fields: Some(FieldMask::new(&[
                    "userEnteredFormat.backgroundColor",
                    "userEnteredFormat.textFormat.bold",
                ])),
            }),
            ..Default::default()
        };

        self.batch_update(spreadsheet_id, vec![request])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(Value::String("a".into())), "a");
        assert_eq!(cell_to_string(Value::Null), "");
        assert_eq!(cell_to_string(serde_json::json!(12.5)), "12.5");
        assert_eq!(cell_to_string(Value::Bool(true)), "true");
    }

    #[test]
    fn test_grid_range_from_span() {
        let range = grid_range(GridSpan::rows(9, 0, 1, 2));
        assert_eq!(range.sheet_id, Some(9));
        assert_eq!(range.start_row_index, Some(0));
        assert_eq!(range.end_row_index, Some(1));
        assert_eq!(range.start_column_index, Some(0));
        assert_eq!(range.end_column_index, Some(2));
    }

    #[test]
    fn test_dimension_range_end_is_exclusive() {
        let range = dimension_range(3, "ROWS", 5, 10);
        assert_eq!(range.start_index, Some(5));
        assert_eq!(range.end_index, Some(15));
        assert_eq!(range.dimension.as_deref(), Some("ROWS"));
    }

    #[test]
    fn test_sheet_properties_requires_id_and_title() {
        let properties = ApiSheetProperties {
            sheet_id: Some(4),
            title: Some("Data".to_string()),
            index: Some(2),
            ..Default::default()
        };
        let converted = sheet_properties(properties).unwrap();
        assert_eq!(converted.sheet_id, 4);
        assert_eq!(converted.index, 2);
        assert_eq!(converted.row_count, 0);

        assert!(sheet_properties(ApiSheetProperties::default()).is_none());
    }
}
