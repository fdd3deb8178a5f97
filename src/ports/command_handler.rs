use thiserror::Error;

use crate::domain::{
    a1_notation::A1Notation,
    drive::{FileId, FolderId},
};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid command: {details}")]
    InvalidCommand { details: String },
    #[error("Command execution failed: {details}")]
    ExecutionFailed { details: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CopySheet {
        source: FileId,
        sheet_name: String,
        folder: FolderId,
        /// `None` skips only the source spreadsheet.
        ignore: Option<Vec<String>>,
    },
    DuplicateSheet {
        spreadsheet: FileId,
        sheet_name: String,
        /// `None` uses the configured branch codes.
        names: Option<Vec<String>>,
    },
    UrlIndex {
        folder: FolderId,
    },
    DeleteSheet {
        sheet_name: String,
        folder: FolderId,
        ignore: Vec<String>,
    },
    RecentlyUpdated {
        folder: FolderId,
        minutes: i64,
    },
    CopyFolder {
        source: FolderId,
        target: FolderId,
    },
    ParentFolder {
        file: FileId,
    },
    CreateSpreadsheet {
        name: String,
        folder: FolderId,
    },
    FirstEmptyRow {
        spreadsheet: FileId,
        range: A1Notation,
        start_row: Option<u32>,
    },
    Help,
}

#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: Command) -> error_stack::Result<String, CommandError>;
}
