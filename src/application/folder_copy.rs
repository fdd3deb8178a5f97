use std::sync::Arc;

use error_stack::ResultExt;
use tracing::{info, instrument};

use crate::domain::drive::{FileEntry, FolderId};
use crate::ports::{
    file_storage::FileStorage,
    operation::{FolderItem, OperationError, SpreadsheetOperation},
};

use super::batch_runner::{BatchError, BatchReport, FolderBatchRunner};

/// Copies each file into `target` under its own name.
pub struct FolderCopyOperation {
    storage: Arc<dyn FileStorage>,
    target: FolderId,
    copies: Vec<FileEntry>,
}

impl FolderCopyOperation {
    pub fn new(storage: Arc<dyn FileStorage>, target: FolderId) -> Self {
        Self {
            storage,
            target,
            copies: Vec::new(),
        }
    }

    pub fn copies(&self) -> &[FileEntry] {
        &self.copies
    }
}

#[async_trait::async_trait]
impl SpreadsheetOperation for FolderCopyOperation {
    fn name(&self) -> &str {
        "copy-folder"
    }

    async fn apply(&mut self, item: &FolderItem) -> error_stack::Result<(), OperationError> {
        let copy = self
            .storage
            .copy_file(&item.entry.id, &item.entry.name, &self.target)
            .await
            .change_context_lazy(|| OperationError::failed(self.name(), item.entry.name.clone()))?;

        info!("Copied '{}' as {}", item.entry.name, copy.id);
        self.copies.push(copy);
        Ok(())
    }
}

/// Copies every spreadsheet of `source` into `target`. An unknown target aborts the run.
#[instrument(skip(runner, storage))]
pub async fn copy_folder(
    runner: &FolderBatchRunner,
    storage: Arc<dyn FileStorage>,
    source: &FolderId,
    target: &FolderId,
) -> error_stack::Result<BatchReport, BatchError> {
    storage
        .folder(target)
        .await
        .change_context_lazy(|| BatchError::FolderResolution(target.to_string()))?;

    let mut operation = FolderCopyOperation::new(storage, target.clone());
    runner.run(source, &mut operation, &[]).await
}
