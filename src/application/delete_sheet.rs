use std::sync::Arc;

use error_stack::ResultExt;
use tracing::{info, instrument};

use crate::domain::drive::FolderId;
use crate::ports::{
    operation::{FolderItem, OperationError, SpreadsheetOperation},
    spreadsheet_service::SpreadsheetService,
};

use super::batch_runner::{BatchError, BatchReport, FolderBatchRunner};

/// Deletes the sheet titled `sheet_name` from each target spreadsheet.
pub struct DeleteSheetOperation {
    sheets: Arc<dyn SpreadsheetService>,
    sheet_name: String,
}

impl DeleteSheetOperation {
    pub fn new(sheets: Arc<dyn SpreadsheetService>, sheet_name: impl Into<String>) -> Self {
        Self {
            sheets,
            sheet_name: sheet_name.into(),
        }
    }
}

#[async_trait::async_trait]
impl SpreadsheetOperation for DeleteSheetOperation {
    fn name(&self) -> &str {
        "delete-sheet"
    }

    async fn apply(&mut self, item: &FolderItem) -> error_stack::Result<(), OperationError> {
        let target = &item.spreadsheet;
        let failed = || OperationError::failed(self.name(), target.name.clone());

        let sheet = self
            .sheets
            .sheet_by_name(&target.id, &self.sheet_name)
            .await
            .change_context_lazy(failed)?;

        self.sheets
            .delete_sheet(&target.id, sheet.sheet_id)
            .await
            .change_context_lazy(failed)?;

        info!("Deleted '{}' from '{}'", self.sheet_name, target.name);
        Ok(())
    }
}

#[instrument(skip(runner, sheets))]
pub async fn delete_sheet_from_all_spreadsheets_in_folder(
    runner: &FolderBatchRunner,
    sheets: Arc<dyn SpreadsheetService>,
    sheet_name: &str,
    folder_id: &FolderId,
    ignore_names: &[String],
) -> error_stack::Result<BatchReport, BatchError> {
    let mut operation = DeleteSheetOperation::new(sheets, sheet_name);
    runner.run(folder_id, &mut operation, ignore_names).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryWorkspace;

    #[tokio::test]
    async fn test_deletes_sheet_and_reports_missing_ones() {
        let workspace = Arc::new(MemoryWorkspace::new());
        let folder = workspace.add_folder("Branches").await;
        let alpha = workspace
            .add_spreadsheet(&folder, "Alpha", &["Sheet1", "Old"])
            .await;
        let beta = workspace.add_spreadsheet(&folder, "Beta", &["Sheet1"]).await;
        let gamma = workspace
            .add_spreadsheet(&folder, "Gamma", &["Sheet1", "Old"])
            .await;
        let runner = FolderBatchRunner::new(workspace.clone(), workspace.clone());

        let report = delete_sheet_from_all_spreadsheets_in_folder(
            &runner,
            workspace.clone(),
            "Old",
            &folder,
            &["Gamma".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(report.applied(), 1);
        assert_eq!(report.failed(), 1, "Beta has no 'Old' sheet");
        assert_eq!(report.ignored(), 1);
        assert_eq!(workspace.sheet_titles(&alpha).await, vec!["Sheet1"]);
        assert_eq!(workspace.sheet_titles(&beta).await, vec!["Sheet1"]);
        assert_eq!(workspace.sheet_titles(&gamma).await, vec!["Sheet1", "Old"]);
    }

    #[tokio::test]
    async fn test_only_sheet_cannot_be_deleted() {
        let workspace = Arc::new(MemoryWorkspace::new());
        let folder = workspace.add_folder("Branches").await;
        let alpha = workspace.add_spreadsheet(&folder, "Alpha", &["Old"]).await;
        let runner = FolderBatchRunner::new(workspace.clone(), workspace.clone());

        let report = delete_sheet_from_all_spreadsheets_in_folder(
            &runner,
            workspace.clone(),
            "Old",
            &folder,
            &[],
        )
        .await
        .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(workspace.sheet_titles(&alpha).await, vec!["Old"]);
    }
}
