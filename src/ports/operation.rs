use thiserror::Error;

use crate::domain::{drive::FileEntry, spreadsheet::SpreadsheetHandle};

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Operation '{operation}' failed on '{file}'")]
    Failed { operation: String, file: String },
}

impl OperationError {
    pub fn failed<S: Into<String>, F: Into<String>>(operation: S, file: F) -> Self {
        OperationError::Failed {
            operation: operation.into(),
            file: file.into(),
        }
    }
}

/// One file of a folder, opened for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderItem {
    pub entry: FileEntry,
    pub spreadsheet: SpreadsheetHandle,
}

/// Work applied to each spreadsheet of a folder by the batch runner.
///
/// The value carries its own context and may accumulate results across calls.
#[async_trait::async_trait]
pub trait SpreadsheetOperation: Send {
    fn name(&self) -> &str;

    async fn apply(&mut self, item: &FolderItem) -> error_stack::Result<(), OperationError>;
}
