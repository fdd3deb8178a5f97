use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use crate::domain::drive::FolderId;
use crate::ports::operation::{FolderItem, OperationError, SpreadsheetOperation};

use super::batch_runner::{BatchError, FolderBatchRunner};

/// Collects the files whose time since last modification exceeds `window`.
#[derive(Debug)]
pub struct RecentlyUpdatedFilter {
    window: Duration,
    now: DateTime<Utc>,
    matches: Vec<FolderItem>,
}

impl RecentlyUpdatedFilter {
    pub fn new(minutes: i64) -> Self {
        Self {
            window: Duration::minutes(minutes),
            now: Utc::now(),
            matches: Vec::new(),
        }
    }

    /// Pins the reference time instead of the moment of construction.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn matches(&self) -> &[FolderItem] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<FolderItem> {
        self.matches
    }
}

#[async_trait::async_trait]
impl SpreadsheetOperation for RecentlyUpdatedFilter {
    fn name(&self) -> &str {
        "recently-updated"
    }

    async fn apply(&mut self, item: &FolderItem) -> error_stack::Result<(), OperationError> {
        let elapsed = self.now - item.entry.modified_time;
        debug!(
            "'{}' last modified {} minutes ago",
            item.entry.name,
            elapsed.num_minutes()
        );

        if elapsed > self.window {
            self.matches.push(item.clone());
        }
        Ok(())
    }
}

#[instrument(skip(runner))]
pub async fn find_recently_updated_files(
    runner: &FolderBatchRunner,
    folder_id: &FolderId,
    minutes: i64,
) -> error_stack::Result<Vec<FolderItem>, BatchError> {
    let mut filter = RecentlyUpdatedFilter::new(minutes);
    runner.run(folder_id, &mut filter, &[]).await?;
    Ok(filter.into_matches())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::MemoryWorkspace;

    #[tokio::test]
    async fn test_window_of_sixty_minutes() {
        let now = Utc::now();
        let workspace = Arc::new(MemoryWorkspace::new());
        let folder = workspace.add_folder("Reports").await;
        workspace
            .add_spreadsheet_modified(&folder, "Fresh", &["S"], now - Duration::minutes(30))
            .await;
        workspace
            .add_spreadsheet_modified(&folder, "Older", &["S"], now - Duration::minutes(90))
            .await;
        let runner = FolderBatchRunner::new(workspace.clone(), workspace.clone());

        let mut filter = RecentlyUpdatedFilter::new(60).at(now);
        runner.run(&folder, &mut filter, &[]).await.unwrap();

        let names: Vec<_> = filter
            .matches()
            .iter()
            .map(|item| item.entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["Older"]);
    }

    #[tokio::test]
    async fn test_exact_window_is_not_exceeded() {
        let now = Utc::now();
        let workspace = Arc::new(MemoryWorkspace::new());
        let folder = workspace.add_folder("Reports").await;
        workspace
            .add_spreadsheet_modified(&folder, "Edge", &["S"], now - Duration::minutes(60))
            .await;
        let runner = FolderBatchRunner::new(workspace.clone(), workspace.clone());

        let mut filter = RecentlyUpdatedFilter::new(60).at(now);
        runner.run(&folder, &mut filter, &[]).await.unwrap();

        assert!(filter.into_matches().is_empty());
    }

    #[tokio::test]
    async fn test_entry_point_uses_current_time() {
        let workspace = Arc::new(MemoryWorkspace::new());
        let folder = workspace.add_folder("Reports").await;
        workspace
            .add_spreadsheet_modified(
                &folder,
                "Last week",
                &["S"],
                Utc::now() - Duration::days(7),
            )
            .await;
        workspace.add_spreadsheet(&folder, "Just now", &["S"]).await;
        let runner = FolderBatchRunner::new(workspace.clone(), workspace.clone());

        let found = find_recently_updated_files(&runner, &folder, 24 * 60)
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entry.name, "Last week");
    }
}
