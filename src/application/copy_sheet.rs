use std::sync::Arc;

use error_stack::ResultExt;
use tracing::{info, instrument};

use crate::domain::{
    drive::{FileId, FolderId},
    spreadsheet::SpreadsheetHandle,
};
use crate::ports::{
    operation::{FolderItem, OperationError, SpreadsheetOperation},
    spreadsheet_service::SpreadsheetService,
};

use super::batch_runner::{BatchError, BatchReport, FolderBatchRunner};

/// Copies one sheet of a source spreadsheet into each target, keeping the sheet's title.
pub struct CopySheetOperation {
    sheets: Arc<dyn SpreadsheetService>,
    source: SpreadsheetHandle,
    sheet_name: String,
}

impl CopySheetOperation {
    pub fn new(
        sheets: Arc<dyn SpreadsheetService>,
        source: SpreadsheetHandle,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            sheets,
            source,
            sheet_name: sheet_name.into(),
        }
    }
}

#[async_trait::async_trait]
impl SpreadsheetOperation for CopySheetOperation {
    fn name(&self) -> &str {
        "copy-sheet"
    }

    async fn apply(&mut self, item: &FolderItem) -> error_stack::Result<(), OperationError> {
        let target = &item.spreadsheet;
        let failed = || OperationError::failed(self.name(), target.name.clone());

        let sheet = self
            .sheets
            .sheet_by_name(&self.source.id, &self.sheet_name)
            .await
            .change_context_lazy(failed)
            .attach_printable_lazy(|| format!("Source: {}", self.source.url))?;

        let copied = self
            .sheets
            .copy_sheet_to(&self.source.id, sheet.sheet_id, &target.id)
            .await
            .change_context_lazy(failed)?;

        self.sheets
            .rename_sheet(&target.id, copied.sheet_id, &self.sheet_name)
            .await
            .change_context_lazy(failed)
            .attach_printable_lazy(|| {
                format!("Copied sheet was left as '{}'", copied.title)
            })?;

        info!("Copied '{}' into '{}'", self.sheet_name, target.name);
        Ok(())
    }
}

/// Copies `sheet_name` from the source spreadsheet into every spreadsheet of the folder.
///
/// `ignore_names` defaults to the source spreadsheet's own name.
#[instrument(skip(runner, sheets))]
pub async fn copy_sheet_to_all_files_in_folder(
    runner: &FolderBatchRunner,
    sheets: Arc<dyn SpreadsheetService>,
    source_id: &FileId,
    sheet_name: &str,
    folder_id: &FolderId,
    ignore_names: Option<Vec<String>>,
) -> error_stack::Result<BatchReport, BatchError> {
    let source = sheets
        .open(source_id)
        .await
        .change_context_lazy(|| BatchError::Source(source_id.to_string()))?;

    let ignore_names = ignore_names.unwrap_or_else(|| vec![source.name.clone()]);
    let mut operation = CopySheetOperation::new(sheets, source, sheet_name);

    runner.run(folder_id, &mut operation, &ignore_names).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryWorkspace;

    struct Fixture {
        workspace: Arc<MemoryWorkspace>,
        runner: FolderBatchRunner,
        folder: FolderId,
        source: FileId,
        alpha: FileId,
        beta: FileId,
    }

    async fn fixture() -> Fixture {
        let workspace = Arc::new(MemoryWorkspace::new());
        let folder = workspace.add_folder("Branches").await;
        let source = workspace
            .add_spreadsheet(&folder, "Master", &["Sheet1", "Checklist"])
            .await;
        workspace
            .set_cells(&source, "Checklist", &[&["Item", "Done"], &["Keys", "no"]])
            .await;
        let alpha = workspace.add_spreadsheet(&folder, "Alpha", &["Sheet1"]).await;
        let beta = workspace.add_spreadsheet(&folder, "Beta", &["Sheet1"]).await;
        let runner = FolderBatchRunner::new(workspace.clone(), workspace.clone());

        Fixture {
            workspace,
            runner,
            folder,
            source,
            alpha,
            beta,
        }
    }

    #[tokio::test]
    async fn test_copies_sheet_into_every_other_spreadsheet() {
        let f = fixture().await;

        let report = copy_sheet_to_all_files_in_folder(
            &f.runner,
            f.workspace.clone(),
            &f.source,
            "Checklist",
            &f.folder,
            None,
        )
        .await
        .unwrap();

        assert_eq!(report.applied(), 2);
        assert_eq!(report.ignored(), 1, "Source is skipped by default");
        assert_eq!(
            f.workspace.sheet_titles(&f.alpha).await,
            vec!["Sheet1", "Checklist"]
        );
        assert_eq!(
            f.workspace.cells(&f.beta, "Checklist").await.unwrap()[1],
            vec!["Keys".to_string(), "no".to_string()]
        );
        assert_eq!(
            f.workspace.sheet_titles(&f.source).await,
            vec!["Sheet1", "Checklist"]
        );
    }

    #[tokio::test]
    async fn test_explicit_ignore_list_replaces_default() {
        let f = fixture().await;

        let report = copy_sheet_to_all_files_in_folder(
            &f.runner,
            f.workspace.clone(),
            &f.source,
            "Checklist",
            &f.folder,
            Some(vec!["Master".to_string(), "Beta".to_string()]),
        )
        .await
        .unwrap();

        assert_eq!(report.applied(), 1);
        assert_eq!(f.workspace.sheet_titles(&f.beta).await, vec!["Sheet1"]);
    }

    #[tokio::test]
    async fn test_missing_source_sheet_fails_each_item() {
        let f = fixture().await;

        let report = copy_sheet_to_all_files_in_folder(
            &f.runner,
            f.workspace.clone(),
            &f.source,
            "Nope",
            &f.folder,
            None,
        )
        .await
        .unwrap();

        assert_eq!(report.failed(), 2);
        assert_eq!(f.workspace.sheet_titles(&f.alpha).await, vec!["Sheet1"]);
    }

    #[tokio::test]
    async fn test_second_run_collides_per_item() {
        let f = fixture().await;
        for _ in 0..2 {
            copy_sheet_to_all_files_in_folder(
                &f.runner,
                f.workspace.clone(),
                &f.source,
                "Checklist",
                &f.folder,
                None,
            )
            .await
            .unwrap();
        }

        // The rename fails, leaving the service-named copy behind
        assert_eq!(
            f.workspace.sheet_titles(&f.alpha).await,
            vec!["Sheet1", "Checklist", "Copy of Checklist"]
        );
    }

    #[tokio::test]
    async fn test_unknown_source_aborts() {
        let f = fixture().await;

        let error = copy_sheet_to_all_files_in_folder(
            &f.runner,
            f.workspace.clone(),
            &FileId::new("missing"),
            "Checklist",
            &f.folder,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(error.current_context(), BatchError::Source(_)));
    }
}
