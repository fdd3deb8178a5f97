use std::sync::Arc;

use error_stack::{Report, ResultExt};
use thiserror::Error;
use tracing::{debug, error, info, instrument, Instrument};

use crate::domain::{
    drive::{FileEntry, FileId, FolderId, MimeType},
    membership::contains,
};
use crate::ports::{
    file_storage::FileStorage,
    operation::{FolderItem, OperationError, SpreadsheetOperation},
    spreadsheet_service::SpreadsheetService,
};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to resolve folder '{0}'")]
    FolderResolution(String),
    #[error("Failed to list spreadsheets in folder '{0}'")]
    Listing(String),
    #[error("Failed to open source spreadsheet '{0}'")]
    Source(String),
}

#[derive(Debug)]
pub enum ItemOutcome {
    Applied,
    Ignored,
    Failed(Report<OperationError>),
}

impl ItemOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemOutcome::Failed(_))
    }
}

/// What happened to each spreadsheet of the folder, in enumeration order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(FileId, ItemOutcome)>,
}

impl BatchReport {
    pub fn applied(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Applied))
    }

    pub fn ignored(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Ignored))
    }

    pub fn failed(&self) -> usize {
        self.count(ItemOutcome::is_failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FileId, &Report<OperationError>)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            ItemOutcome::Failed(report) => Some((id, report)),
            _ => None,
        })
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} applied, {} ignored, {} failed",
            self.applied(),
            self.ignored(),
            self.failed()
        )
    }
}

/// Applies an operation to every spreadsheet of a folder, one at a time.
///
/// A failing file is logged and recorded; the run always continues with the next file.
pub struct FolderBatchRunner {
    storage: Arc<dyn FileStorage>,
    sheets: Arc<dyn SpreadsheetService>,
}

impl std::fmt::Debug for FolderBatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderBatchRunner").finish_non_exhaustive()
    }
}

impl FolderBatchRunner {
    pub fn new(storage: Arc<dyn FileStorage>, sheets: Arc<dyn SpreadsheetService>) -> Self {
        Self { storage, sheets }
    }

    #[instrument(skip(self, operation), fields(operation = operation.name()))]
    pub async fn run(
        &self,
        folder_id: &FolderId,
        operation: &mut dyn SpreadsheetOperation,
        ignore_names: &[String],
    ) -> error_stack::Result<BatchReport, BatchError> {
        let folder = self
            .storage
            .folder(folder_id)
            .await
            .change_context_lazy(|| BatchError::FolderResolution(folder_id.to_string()))?;

        let entries = self
            .storage
            .list_files(folder_id, &MimeType::Spreadsheet)
            .await
            .change_context_lazy(|| BatchError::Listing(folder_id.to_string()))?;

        info!(
            "Running '{}' over {} spreadsheets in '{}'",
            operation.name(),
            entries.len(),
            folder.name
        );

        let mut report = BatchReport::default();
        let len = entries.len();

        for (index, entry) in entries.into_iter().enumerate() {
            if contains(ignore_names, entry.name.as_str()) {
                debug!("Ignoring '{}'", entry.name);
                report.outcomes.push((entry.id, ItemOutcome::Ignored));
                continue;
            }

            let span = tracing::span!(
                tracing::Level::INFO,
                "file",
                name = entry.name.as_str(),
                index = index,
                len = len
            );
            let file_id = entry.id.clone();
            let outcome = self.visit(entry, operation).instrument(span).await;
            report.outcomes.push((file_id, outcome));
        }

        info!("'{}' finished: {}", operation.name(), report);
        Ok(report)
    }

    async fn visit(
        &self,
        entry: FileEntry,
        operation: &mut dyn SpreadsheetOperation,
    ) -> ItemOutcome {
        let spreadsheet = match self.sheets.open(&entry.id).await {
            Ok(spreadsheet) => spreadsheet,
            Err(report) => {
                error!("❌ Could not open '{}' ({}): {:?}", entry.name, entry.id, report);
                return ItemOutcome::Failed(
                    report
                        .change_context(OperationError::failed(operation.name(), entry.name))
                        .attach_printable(format!("Spreadsheet: {}", entry.id)),
                );
            }
        };

        let item = FolderItem { entry, spreadsheet };
        match operation.apply(&item).await {
            Ok(()) => {
                debug!("✅ {}", item.spreadsheet.url);
                ItemOutcome::Applied
            }
            Err(report) => {
                error!("❌ {}: {:?}", item.spreadsheet.url, report);
                ItemOutcome::Failed(report)
            }
        }
    }
}
