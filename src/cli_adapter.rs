use std::sync::Arc;

use error_stack::{report, ResultExt};
use tracing::{error, info, instrument};

use crate::application::{
    batch_runner::{BatchReport, FolderBatchRunner, ItemOutcome},
    copy_sheet::copy_sheet_to_all_files_in_folder,
    delete_sheet::delete_sheet_from_all_spreadsheets_in_folder,
    duplicate_sheet::duplicate_sheet,
    empty_row::first_empty_row,
    folder_copy::copy_folder,
    folders::{create_spreadsheet_in_folder, parent_folder},
    recently_updated::find_recently_updated_files,
    url_index::create_url_sheet_for_folder,
};
use crate::ports::{
    command_handler::{Command, CommandError, CommandHandler},
    file_storage::FileStorage,
    spreadsheet_service::SpreadsheetService,
};

pub const USAGE: &str = "\
Usage: drive-sheets <command> [arguments]

Commands:
  copy-sheet <source-spreadsheet> <sheet> <folder> [--ignore <name>]...
  duplicate-sheet <spreadsheet> <sheet> [new-name]...
  url-index <folder>
  delete-sheet <sheet> <folder> [--ignore <name>]...
  recently-updated <folder> <minutes>
  copy-folder <source-folder> <target-folder>
  parent-folder <file>
  create-spreadsheet <name> <folder>
  first-empty-row <spreadsheet> <range> [--start <row>]
  help

Folders and files accept either a raw id or a Drive URL.";

/// Positional arguments plus the flags shared by the batch commands.
#[derive(Debug, Default)]
struct Arguments {
    positional: Vec<String>,
    ignore: Vec<String>,
    start: Option<String>,
}

impl Arguments {
    fn parse(args: &[String]) -> Result<Self, CommandError> {
        let mut parsed = Arguments::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--ignore" => parsed.ignore.push(flag_value(&mut iter, "--ignore")?),
                "--start" => parsed.start = Some(flag_value(&mut iter, "--start")?),
                _ => parsed.positional.push(arg.clone()),
            }
        }
        Ok(parsed)
    }

    fn required(&self, index: usize, what: &str) -> Result<&str, CommandError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandError::InvalidCommand {
                details: format!("{} required", what),
            })
    }

    fn parsed<T>(&self, index: usize, what: &str) -> Result<T, CommandError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(index, what)?;
        raw.parse().map_err(|e| CommandError::InvalidCommand {
            details: format!("Invalid {} '{}': {}", what, raw, e),
        })
    }
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<String, CommandError> {
    iter.next().cloned().ok_or_else(|| CommandError::InvalidCommand {
        details: format!("{} expects a value", flag),
    })
}

pub struct CliAdapter {
    storage: Arc<dyn FileStorage>,
    sheets: Arc<dyn SpreadsheetService>,
    runner: FolderBatchRunner,
    branches: Vec<String>,
}

impl std::fmt::Debug for CliAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliAdapter")
            .field("storage", &"<FileStorage>")
            .field("sheets", &"<SpreadsheetService>")
            .field("branches", &self.branches)
            .finish()
    }
}

impl CliAdapter {
    pub fn new(
        storage: Arc<dyn FileStorage>,
        sheets: Arc<dyn SpreadsheetService>,
        branches: Vec<String>,
    ) -> Self {
        let runner = FolderBatchRunner::new(Arc::clone(&storage), Arc::clone(&sheets));
        Self {
            storage,
            sheets,
            runner,
            branches,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
        let command = Self::parse_args(&args)?;

        match self.handle(command).await {
            Ok(result) => {
                info!("{}", result);
                Ok(())
            }
            Err(report) => {
                error!("Command failed: {:?}", report);
                Err(format!("Command failed: {}", report.current_context()).into())
            }
        }
    }

    /// `args[0]` is the program name.
    pub fn parse_args(args: &[String]) -> Result<Command, CommandError> {
        let Some(name) = args.get(1) else {
            return Ok(Command::Help);
        };
        let rest = Arguments::parse(&args[2..])?;

        match name.as_str() {
            "copy-sheet" => Ok(Command::CopySheet {
                source: rest.parsed(0, "Source spreadsheet")?,
                sheet_name: rest.required(1, "Sheet name")?.to_string(),
                folder: rest.parsed(2, "Folder")?,
                ignore: (!rest.ignore.is_empty()).then_some(rest.ignore.clone()),
            }),
            "duplicate-sheet" => Ok(Command::DuplicateSheet {
                spreadsheet: rest.parsed(0, "Spreadsheet")?,
                sheet_name: rest.required(1, "Sheet name")?.to_string(),
                names: (rest.positional.len() > 2).then(|| rest.positional[2..].to_vec()),
            }),
            "url-index" => Ok(Command::UrlIndex {
                folder: rest.parsed(0, "Folder")?,
            }),
            "delete-sheet" => Ok(Command::DeleteSheet {
                sheet_name: rest.required(0, "Sheet name")?.to_string(),
                folder: rest.parsed(1, "Folder")?,
                ignore: rest.ignore.clone(),
            }),
            "recently-updated" => Ok(Command::RecentlyUpdated {
                folder: rest.parsed(0, "Folder")?,
                minutes: rest.parsed(1, "Minutes")?,
            }),
            "copy-folder" => Ok(Command::CopyFolder {
                source: rest.parsed(0, "Source folder")?,
                target: rest.parsed(1, "Target folder")?,
            }),
            "parent-folder" => Ok(Command::ParentFolder {
                file: rest.parsed(0, "File")?,
            }),
            "create-spreadsheet" => Ok(Command::CreateSpreadsheet {
                name: rest.required(0, "Spreadsheet name")?.to_string(),
                folder: rest.parsed(1, "Folder")?,
            }),
            "first-empty-row" => Ok(Command::FirstEmptyRow {
                spreadsheet: rest.parsed(0, "Spreadsheet")?,
                range: rest.required(1, "Range")?.into(),
                start_row: rest
                    .start
                    .as_deref()
                    .map(|raw| {
                        raw.parse().map_err(|e| CommandError::InvalidCommand {
                            details: format!("Invalid start row '{}': {}", raw, e),
                        })
                    })
                    .transpose()?,
            }),
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(CommandError::InvalidCommand {
                details: format!("Unknown command '{}'\n\n{}", other, USAGE),
            }),
        }
    }
}

fn batch_summary(title: &str, report: &BatchReport) -> String {
    let mut output = format!("\n{}:\n", title);

    for (file, outcome) in &report.outcomes {
        match outcome {
            ItemOutcome::Applied => output.push_str(&format!("✅ {}: OK\n", file)),
            ItemOutcome::Ignored => output.push_str(&format!("⏭️ {}: ignored\n", file)),
            ItemOutcome::Failed(error) => {
                output.push_str(&format!("❌ {}: {}\n", file, error.current_context()))
            }
        }
    }

    output.push_str(&format!("\nSummary: {}", report));
    output
}

fn execution_failed(what: &str) -> CommandError {
    CommandError::ExecutionFailed {
        details: what.to_string(),
    }
}

#[async_trait::async_trait]
impl CommandHandler for CliAdapter {
    #[instrument(skip(self))]
    async fn handle(&self, command: Command) -> error_stack::Result<String, CommandError> {
        match command {
            Command::CopySheet {
                source,
                sheet_name,
                folder,
                ignore,
            } => {
                let report = copy_sheet_to_all_files_in_folder(
                    &self.runner,
                    Arc::clone(&self.sheets),
                    &source,
                    &sheet_name,
                    &folder,
                    ignore,
                )
                .await
                .change_context_lazy(|| {
                    execution_failed(&format!("Failed to copy sheet '{}'", sheet_name))
                })?;

                Ok(batch_summary(
                    &format!("Copy of '{}' into folder {}", sheet_name, folder),
                    &report,
                ))
            }
            Command::DuplicateSheet {
                spreadsheet,
                sheet_name,
                names,
            } => {
                let names = names.unwrap_or_else(|| self.branches.clone());
                let report = duplicate_sheet(self.sheets.as_ref(), &spreadsheet, &sheet_name, &names)
                    .await
                    .change_context_lazy(|| {
                        execution_failed(&format!("Failed to duplicate sheet '{}'", sheet_name))
                    })?;

                let mut output = format!("\nDuplicates of '{}':\n", sheet_name);
                for (name, result) in &report.outcomes {
                    match result {
                        Ok(_) => output.push_str(&format!("✅ {}: OK\n", name)),
                        Err(error) => {
                            output.push_str(&format!("❌ {}: {}\n", name, error.current_context()))
                        }
                    }
                }
                output.push_str(&format!(
                    "\nSummary: {} created, {} failed",
                    report.created().len(),
                    report.failed()
                ));
                Ok(output)
            }
            Command::UrlIndex { folder } => {
                let index = create_url_sheet_for_folder(
                    &self.runner,
                    Arc::clone(&self.storage),
                    Arc::clone(&self.sheets),
                    &folder,
                )
                .await
                .change_context_lazy(|| {
                    execution_failed(&format!("Failed to index folder {}", folder))
                })?;

                Ok(format!(
                    "{}\n✅ Index '{}' written to {}",
                    batch_summary(&format!("Links of folder {}", folder), &index.report),
                    index.sheet_title,
                    index.spreadsheet.url
                ))
            }
            Command::DeleteSheet {
                sheet_name,
                folder,
                ignore,
            } => {
                let report = delete_sheet_from_all_spreadsheets_in_folder(
                    &self.runner,
                    Arc::clone(&self.sheets),
                    &sheet_name,
                    &folder,
                    &ignore,
                )
                .await
                .change_context_lazy(|| {
                    execution_failed(&format!("Failed to delete sheet '{}'", sheet_name))
                })?;

                Ok(batch_summary(
                    &format!("Deletion of '{}' in folder {}", sheet_name, folder),
                    &report,
                ))
            }
            Command::RecentlyUpdated { folder, minutes } => {
                let items = find_recently_updated_files(&self.runner, &folder, minutes)
                    .await
                    .change_context_lazy(|| {
                        execution_failed(&format!("Failed to scan folder {}", folder))
                    })?;

                let mut output = format!(
                    "\nFiles last modified more than {} minutes ago:\n",
                    minutes
                );
                for item in &items {
                    output.push_str(&format!(
                        "{} ({}) {}\n",
                        item.entry.name,
                        item.entry.modified_time.to_rfc3339(),
                        item.spreadsheet.url
                    ));
                }
                output.push_str(&format!("\nSummary: {} files", items.len()));
                Ok(output)
            }
            Command::CopyFolder { source, target } => {
                let report = copy_folder(&self.runner, Arc::clone(&self.storage), &source, &target)
                    .await
                    .change_context_lazy(|| {
                        execution_failed(&format!("Failed to copy folder {}", source))
                    })?;

                Ok(batch_summary(
                    &format!("Copy of folder {} into {}", source, target),
                    &report,
                ))
            }
            Command::ParentFolder { file } => {
                let folder = parent_folder(self.storage.as_ref(), &file)
                    .await
                    .change_context_lazy(|| {
                        execution_failed(&format!("Failed to find the parent of {}", file))
                    })?;

                Ok(format!("{} ({})", folder.name, folder.id))
            }
            Command::CreateSpreadsheet { name, folder } => {
                let spreadsheet = create_spreadsheet_in_folder(
                    self.storage.as_ref(),
                    self.sheets.as_ref(),
                    &name,
                    &folder,
                )
                .await
                .change_context_lazy(|| {
                    execution_failed(&format!("Failed to create spreadsheet '{}'", name))
                })?;

                Ok(format!("✅ Created '{}': {}", spreadsheet.name, spreadsheet.url))
            }
            Command::FirstEmptyRow {
                spreadsheet,
                range,
                start_row,
            } => {
                let row = first_empty_row(self.sheets.as_ref(), &spreadsheet, &range, start_row)
                    .await
                    .change_context_lazy(|| {
                        execution_failed(&format!("Failed to read range {}", range))
                    })?;

                match row {
                    Some(row) => Ok(row.to_string()),
                    None => Err(report!(execution_failed(&format!(
                        "No empty row in range {}",
                        range
                    )))),
                }
            }
            Command::Help => Ok(USAGE.to_string()),
        }
    }
}
