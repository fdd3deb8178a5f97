use error_stack::ResultExt;
use tracing::{error, info, instrument};

use crate::domain::{drive::FileId, spreadsheet::SheetProperties};
use crate::ports::{service_error::ServiceError, spreadsheet_service::SpreadsheetService};

/// One tab per branch, in the order they are created.
pub const DEFAULT_BRANCH_CODES: [&str; 11] = [
    "AST", "BK", "CH", "FP", "JA", "JH", "OP", "PC", "RH", "SUN", "SUT",
];

pub fn default_branch_names() -> Vec<String> {
    DEFAULT_BRANCH_CODES.iter().map(|code| code.to_string()).collect()
}

#[derive(Debug, Default)]
pub struct DuplicateReport {
    pub outcomes: Vec<(String, error_stack::Result<SheetProperties, ServiceError>)>,
}

impl DuplicateReport {
    pub fn created(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, result)| result.is_err()).count()
    }
}

/// Copies `sheet_name` once per entry of `new_names`, naming each copy after the entry.
///
/// A name that already exists fails alone; the remaining copies are still made.
#[instrument(skip(sheets))]
pub async fn duplicate_sheet(
    sheets: &dyn SpreadsheetService,
    spreadsheet_id: &FileId,
    sheet_name: &str,
    new_names: &[String],
) -> error_stack::Result<DuplicateReport, ServiceError> {
    let sheet = sheets
        .sheet_by_name(spreadsheet_id, sheet_name)
        .await
        .attach_printable("Nothing to duplicate")?;

    let mut report = DuplicateReport::default();
    for new_name in new_names {
        let result = sheets
            .duplicate_sheet(spreadsheet_id, sheet.sheet_id, new_name)
            .await;

        match &result {
            Ok(_) => info!("✅ '{}' -> '{}'", sheet_name, new_name),
            Err(err) => error!("❌ '{}' -> '{}': {:?}", sheet_name, new_name, err),
        }
        report.outcomes.push((new_name.clone(), result));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryWorkspace;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_creates_one_copy_per_name() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Root").await;
        let file = workspace.add_spreadsheet(&folder, "Plan", &["Template"]).await;
        workspace.set_cells(&file, "Template", &[&["Target", "10"]]).await;

        let report = duplicate_sheet(&workspace, &file, "Template", &names(&["AST", "BK"]))
            .await
            .unwrap();

        assert_eq!(report.created(), vec!["AST", "BK"]);
        assert_eq!(
            workspace.sheet_titles(&file).await,
            vec!["Template", "AST", "BK"]
        );
        assert_eq!(
            workspace.cells(&file, "BK").await.unwrap(),
            vec![vec!["Target".to_string(), "10".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_existing_name_is_skipped_and_loop_continues() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Root").await;
        let file = workspace
            .add_spreadsheet(&folder, "Plan", &["Template", "AST"])
            .await;

        let report = duplicate_sheet(&workspace, &file, "Template", &names(&["AST", "BK"]))
            .await
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcomes[0].1.as_ref().unwrap_err().current_context(),
            ServiceError::NameCollision { name } if name == "AST"
        ));
        assert_eq!(
            workspace.sheet_titles(&file).await,
            vec!["Template", "AST", "BK"]
        );
    }

    #[tokio::test]
    async fn test_default_branches() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Root").await;
        let file = workspace.add_spreadsheet(&folder, "Plan", &["Template"]).await;

        let report = duplicate_sheet(&workspace, &file, "Template", &default_branch_names())
            .await
            .unwrap();

        assert_eq!(report.created().len(), 11);
        assert_eq!(workspace.sheet_titles(&file).await.last().unwrap(), "SUT");
    }

    #[tokio::test]
    async fn test_missing_source_sheet_is_not_found() {
        let workspace = MemoryWorkspace::new();
        let folder = workspace.add_folder("Root").await;
        let file = workspace.add_spreadsheet(&folder, "Plan", &["Sheet1"]).await;

        let error = duplicate_sheet(&workspace, &file, "Template", &names(&["AST"]))
            .await
            .unwrap_err();

        assert!(error.current_context().is_not_found());
        assert_eq!(workspace.sheet_titles(&file).await, vec!["Sheet1"]);
    }
}
